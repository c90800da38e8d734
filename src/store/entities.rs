use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::Utc;
use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;

/// Fixed set of block kinds. Ordering of [BlockType::ALL] is the display
/// ordering used everywhere, independent of frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum BlockType {
    Deep,
    Short,
    Micro,
    Gym,
    Family,
}

impl BlockType {
    pub const ALL: [BlockType; 5] = [
        BlockType::Deep,
        BlockType::Short,
        BlockType::Micro,
        BlockType::Gym,
        BlockType::Family,
    ];

    /// Suggested duration used when a block is logged without `--minutes`.
    pub fn default_minutes(&self) -> u32 {
        match self {
            BlockType::Deep => 90,
            BlockType::Short => 30,
            BlockType::Micro => 15,
            BlockType::Gym => 60,
            BlockType::Family => 120,
        }
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::Deep => write!(f, "Deep"),
            BlockType::Short => write!(f, "Short"),
            BlockType::Micro => write!(f, "Micro"),
            BlockType::Gym => write!(f, "Gym"),
            BlockType::Family => write!(f, "Family"),
        }
    }
}

/// Year-month key in `YYYY-MM` form. Targets are stored per month and
/// queried by equality on this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<MonthKey> {
        if (1..=12).contains(&month) {
            Some(MonthKey { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> MonthKey {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }

    pub fn succ(&self) -> MonthKey {
        if self.month == 12 {
            MonthKey {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthKey {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// All months from `from` to `to` inclusive. Empty when `to < from`.
    pub fn range_inclusive(from: MonthKey, to: MonthKey) -> Vec<MonthKey> {
        let mut months = vec![];
        let mut current = from;
        while current <= to {
            months.push(current);
            current = current.succ();
        }
        months
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("Expected YYYY-MM, got {s}"))?;
        let year = year.parse::<i32>()?;
        let month = month.parse::<u32>()?;
        MonthKey::new(year, month).ok_or_else(|| anyhow!("Month out of range in {s}"))
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A life category blocks are tagged with. `display_order` is the manual
/// sort position; areas without one sort after every ordered area.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct AreaEntity {
    pub id: u64,
    pub name: Arc<str>,
    pub color: Arc<str>,
    #[serde(default)]
    pub display_order: Option<u32>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// One logged unit of time-boxed activity, day granularity.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct BlockEntity {
    pub id: u64,
    pub date: NaiveDate,
    pub area_id: u64,
    pub block_type: BlockType,
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: Option<Arc<str>>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

impl BlockEntity {
    pub fn month_key(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }

    pub fn with_date(self, date: NaiveDate) -> Self {
        Self { date, ..self }
    }

    pub fn with_duration(self, duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            ..self
        }
    }
}

/// A goal count of blocks for an area in a given month. A missing
/// `block_type` means the target counts blocks of any type.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct TargetEntity {
    pub id: u64,
    pub month: MonthKey,
    pub area_id: u64,
    #[serde(default)]
    pub block_type: Option<BlockType>,
    pub target_count: u32,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

impl TargetEntity {
    /// Whether a block counts towards this target.
    pub fn matches(&self, block: &BlockEntity) -> bool {
        self.area_id == block.area_id
            && self
                .block_type
                .map(|t| t == block.block_type)
                .unwrap_or(true)
    }
}

/// Insert payloads. The store assigns ids and creation timestamps.
#[derive(Debug, Clone)]
pub struct NewArea {
    pub name: Arc<str>,
    pub color: Arc<str>,
    pub display_order: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct NewBlock {
    pub date: NaiveDate,
    pub area_id: u64,
    pub block_type: BlockType,
    pub duration_minutes: u32,
    pub notes: Option<Arc<str>>,
}

impl From<BlockEntity> for NewBlock {
    fn from(block: BlockEntity) -> Self {
        // Duplication keeps every field including the source date.
        NewBlock {
            date: block.date,
            area_id: block.area_id,
            block_type: block.block_type,
            duration_minutes: block.duration_minutes,
            notes: block.notes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTarget {
    pub month: MonthKey,
    pub area_id: u64,
    pub block_type: Option<BlockType>,
    pub target_count: u32,
}

#[cfg(test)]
mod tests {
    use super::MonthKey;

    #[test]
    fn month_key_parse_and_display() {
        let key: MonthKey = "2024-05".parse().unwrap();
        assert_eq!(key.year(), 2024);
        assert_eq!(key.month(), 5);
        assert_eq!(key.to_string(), "2024-05");

        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("2024".parse::<MonthKey>().is_err());
    }

    #[test]
    fn month_key_range_spans_year_boundary() {
        let from = MonthKey::new(2023, 11).unwrap();
        let to = MonthKey::new(2024, 2).unwrap();
        let range = MonthKey::range_inclusive(from, to);
        assert_eq!(range.len(), 4);
        assert_eq!(range[0].to_string(), "2023-11");
        assert_eq!(range[3].to_string(), "2024-02");
    }

    #[test]
    fn month_key_range_single_month() {
        let key = MonthKey::new(2024, 5).unwrap();
        assert_eq!(MonthKey::range_inclusive(key, key), vec![key]);
        assert!(MonthKey::range_inclusive(key.succ(), key).is_empty());
    }
}
