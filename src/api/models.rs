use serde::{Deserialize, Serialize};

use crate::cache::ScheduleOrigin;
use crate::prayer::Prayer;

#[derive(Deserialize)]
pub struct SelectLocationRequest {
    pub region: String,
    pub city_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    pub prayer: Prayer,
    pub name: String,
    pub time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleView {
    pub location_label: String,
    pub region_label: String,
    pub date: String,
    pub origin: ScheduleOrigin,
    pub entries: Vec<ScheduleEntry>,
    #[serde(rename = "schedule_text")]
    pub text: String,
}

#[derive(Serialize)]
pub struct ClosedAlert {
    pub closed: bool,
}
