pub mod config;
pub mod dataset;

// One of the twelve administrative districts, identified by its two-digit
// code ("01" up to "12"). Stored numerically, rendered zero-padded.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct DistrictId(pub u8);

impl DistrictId {
    pub fn as_code(&self) -> String {
        format!("{:02}", self.0)
    }
}
