//! Navigation port - how the coordinator leaves the call screen

use serde::{Deserialize, Serialize};

/// Where to go once a call is over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The meetings list; used when the call was bound to a meeting
    MeetingList,
    /// Default landing page
    Landing,
}

impl Destination {
    pub fn after_call(has_meeting: bool) -> Self {
        if has_meeting {
            Destination::MeetingList
        } else {
            Destination::Landing
        }
    }
}

/// Router of the surrounding UI layer
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_after_call() {
        assert_eq!(Destination::after_call(true), Destination::MeetingList);
        assert_eq!(Destination::after_call(false), Destination::Landing);
    }
}
