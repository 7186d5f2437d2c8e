use serde::Serialize;

/// Parsed route XML: every placemark found, in document order.
#[derive(Debug, Default)]
pub struct RouteDocument {
    pub placemarks: Vec<Placemark>,
}

/// A single `<Placemark>`.
///
/// Leaf fields hold cleaned text and are `Some` once the first matching child
/// has been seen, even when that child is empty.
#[derive(Debug, Default, Clone)]
pub struct Placemark {
    pub name: Option<String>,
    pub description: Option<String>,
    pub creation_time_utc: Option<String>,
    pub is_manually_corrected: Option<String>,
    pub route_info: Option<RouteInfo>,
}

impl Placemark {
    /// Slot for a scalar child element, keyed by its local name.
    pub fn field_mut(&mut self, local_name: &[u8]) -> Option<&mut Option<String>> {
        match local_name {
            b"name" => Some(&mut self.name),
            b"description" => Some(&mut self.description),
            b"CreationTimeUTC" => Some(&mut self.creation_time_utc),
            b"IsManuallyCorrected" => Some(&mut self.is_manually_corrected),
            _ => None,
        }
    }
}

/// A `<RouteInfo>` subtree.
#[derive(Debug, Default, Clone)]
pub struct RouteInfo {
    pub ignoring_restrictions: Option<String>,
    /// `MapCorrectionInfo/DatasetInfo/ImageInfo/ImageName`
    pub image_name: Option<String>,
    /// `MapCorrectionInfo/DatasetInfo/ImageInfo/StartMapId`
    pub start_map_id: Option<String>,
    /// Raw `ViaPoints/NumVia` text.
    pub num_via: Option<String>,
    pub via_points: Vec<ViaPoint>,
}

/// A `<ViaPoint>` inside `<ViaPoints>`.
#[derive(Debug, Default, Clone)]
pub struct ViaPoint {
    pub position: Option<String>,
    pub group_id: Option<String>,
    pub segment: Option<String>,
    pub heading: Option<String>,
    pub via_type: Option<String>,
    pub link_to_geom: Option<String>,
    pub direction: Option<String>,
    pub tts_remark: Option<String>,
    pub work_type: Option<String>,
    pub mm_rule: Option<String>,
    pub maneuver_id: Option<String>,
    pub maneuver_number: Option<String>,
    pub is_dead_end: Option<String>,
}

impl ViaPoint {
    /// Slot for a child element, keyed by its local name.
    pub fn field_mut(&mut self, local_name: &[u8]) -> Option<&mut Option<String>> {
        let slot = match local_name {
            b"Position" => &mut self.position,
            b"GroupID" => &mut self.group_id,
            b"Segment" => &mut self.segment,
            b"Heading" => &mut self.heading,
            b"Type" => &mut self.via_type,
            b"LinkToGeom" => &mut self.link_to_geom,
            b"Direction" => &mut self.direction,
            b"TTSRemark" => &mut self.tts_remark,
            b"WorkType" => &mut self.work_type,
            b"MMRule" => &mut self.mm_rule,
            b"ManeuverID" => &mut self.maneuver_id,
            b"ManeuverNumber" => &mut self.maneuver_number,
            b"IsDeadEnd" => &mut self.is_dead_end,
            _ => return None,
        };
        Some(slot)
    }
}

/// One row of the main table.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub name: String,
    pub description: String,
    pub creation_time_utc: String,
    pub is_manually_corrected: String,
    pub total_distance_km: f64,
    pub ignoring_restrictions: String,
    pub image_name: String,
    pub start_map_id: String,
    pub num_via: i64,
    /// Single-line JSON array of [`WaypointSummary`] values.
    pub via_points_json: String,
}

/// One row of the detail table.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointRecord {
    pub placemark_index: usize,
    pub placemark_name: String,
    pub seq: usize,
    pub position: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub group_id: String,
    pub segment: String,
    pub heading: String,
    pub via_type: String,
    pub link_to_geom: String,
    pub direction: String,
    pub tts_remark: String,
    pub work_type: String,
    pub mm_rule: String,
    pub maneuver_id: String,
    pub maneuver_number: String,
    pub is_dead_end: String,
}

/// Compact waypoint entry embedded as JSON in the main table.
#[derive(Debug, Clone, Serialize)]
pub struct WaypointSummary<'a> {
    #[serde(rename = "Position")]
    pub position: &'a str,
    #[serde(rename = "GroupID")]
    pub group_id: &'a str,
    #[serde(rename = "Segment")]
    pub segment: &'a str,
    #[serde(rename = "Heading")]
    pub heading: &'a str,
    #[serde(rename = "Type")]
    pub via_type: &'a str,
    #[serde(rename = "LinkToGeom")]
    pub link_to_geom: &'a str,
    #[serde(rename = "Direction")]
    pub direction: &'a str,
    #[serde(rename = "WorkType")]
    pub work_type: &'a str,
    #[serde(rename = "MMRule")]
    pub mm_rule: &'a str,
    #[serde(rename = "ManeuverID")]
    pub maneuver_id: &'a str,
    #[serde(rename = "ManeuverNumber")]
    pub maneuver_number: &'a str,
    #[serde(rename = "IsDeadEnd")]
    pub is_dead_end: &'a str,
}

impl<'a> From<&'a WaypointRecord> for WaypointSummary<'a> {
    fn from(wp: &'a WaypointRecord) -> Self {
        Self {
            position: &wp.position,
            group_id: &wp.group_id,
            segment: &wp.segment,
            heading: &wp.heading,
            via_type: &wp.via_type,
            link_to_geom: &wp.link_to_geom,
            direction: &wp.direction,
            work_type: &wp.work_type,
            mm_rule: &wp.mm_rule,
            maneuver_id: &wp.maneuver_id,
            maneuver_number: &wp.maneuver_number,
            is_dead_end: &wp.is_dead_end,
        }
    }
}
