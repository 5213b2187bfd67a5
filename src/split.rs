//! Known dataset splits.

use std::fmt;

use serde::Serialize;

/// A named partition of the COCO 2017 release.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum,
)]
pub enum Split {
    #[serde(rename = "train2017")]
    #[value(name = "train2017")]
    Train2017,

    #[serde(rename = "val2017")]
    #[value(name = "val2017")]
    Val2017,
}

/// The role a split plays for a training tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitRole {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train2017, Split::Val2017];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train2017 => "train2017",
            Split::Val2017 => "val2017",
        }
    }

    pub fn role(&self) -> SplitRole {
        match self {
            Split::Train2017 => SplitRole::Train,
            Split::Val2017 => SplitRole::Val,
        }
    }

    /// File name of the official instances annotation file for this split.
    pub fn instances_file_name(&self) -> String {
        format!("instances_{}.json", self.as_str())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
