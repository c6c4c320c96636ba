use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::parse_clock;

/// The five daily prayers, in the order they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prayer {
    Subuh,
    Dzuhur,
    Ashar,
    Maghrib,
    Isya,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Subuh,
        Prayer::Dzuhur,
        Prayer::Ashar,
        Prayer::Maghrib,
        Prayer::Isya,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Prayer::Subuh => "subuh",
            Prayer::Dzuhur => "dzuhur",
            Prayer::Ashar => "ashar",
            Prayer::Maghrib => "maghrib",
            Prayer::Isya => "isya",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Prayer::Subuh => "Subuh",
            Prayer::Dzuhur => "Dzuhur",
            Prayer::Ashar => "Ashar",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isya => "Isya",
        }
    }

    /// Reminder shown on the alert surface.
    pub fn message(self) -> &'static str {
        match self {
            Prayer::Subuh => "Wake up and pray Subuh. The angels of dawn witness your devotion.",
            Prayer::Dzuhur => "Pause your work for a moment and reconnect with your Creator.",
            Prayer::Ashar => "Ashar has arrived. Do not let the world distract you from what matters more.",
            Prayer::Maghrib => "The sun has set. Pray before the light of Maghrib fades.",
            Prayer::Isya => "End your day in worship. Isya brings calm to a restless soul.",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Five clock times for one date and one location.
///
/// Entries the API left out stay `None` and are skipped when triggering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerSchedule {
    pub subuh: Option<String>,
    pub dzuhur: Option<String>,
    pub ashar: Option<String>,
    pub maghrib: Option<String>,
    pub isya: Option<String>,
}

impl PrayerSchedule {
    pub fn get(&self, prayer: Prayer) -> Option<&str> {
        let time = match prayer {
            Prayer::Subuh => &self.subuh,
            Prayer::Dzuhur => &self.dzuhur,
            Prayer::Ashar => &self.ashar,
            Prayer::Maghrib => &self.maghrib,
            Prayer::Isya => &self.isya,
        };
        time.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_complete(&self) -> bool {
        Prayer::ALL.iter().all(|p| self.get(*p).is_some())
    }

    /// Present entries in fixed prayer order.
    pub fn entries(&self) -> impl Iterator<Item = (Prayer, &str)> + '_ {
        Prayer::ALL
            .into_iter()
            .filter_map(move |p| self.get(p).map(|t| (p, t)))
    }

    /// First prayer strictly after `now_minutes`; after Isya this is
    /// tomorrow's Subuh, shown with today's Subuh time.
    pub fn next_prayer(&self, now_minutes: u32) -> Option<NextPrayer> {
        for (prayer, time) in self.entries() {
            match parse_clock(time) {
                Some(minutes) if minutes > now_minutes => {
                    return Some(NextPrayer {
                        prayer,
                        time: time.to_string(),
                    });
                }
                _ => continue,
            }
        }

        self.get(Prayer::Subuh).map(|time| NextPrayer {
            prayer: Prayer::Subuh,
            time: time.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextPrayer {
    pub prayer: Prayer,
    pub time: String,
}
