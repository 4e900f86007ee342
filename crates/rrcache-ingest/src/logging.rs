// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Plan,
    Verify,
    Fetch,
    Parse,
    Persist,
    Finalize,
}

impl BuildStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Verify => "verify",
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Persist => "persist",
            Self::Finalize => "finalize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildEvent {
    pub stage: BuildStage,
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

/// Ordered record of what one build did, returned in the build report.
#[derive(Debug, Default, Clone)]
pub struct BuildLog {
    events: Vec<BuildEvent>,
}

impl BuildLog {
    pub fn emit<const N: usize>(
        &mut self,
        stage: BuildStage,
        name: impl Into<String>,
        fields: [(&str, String); N],
    ) {
        let name = name.into();
        let fields: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        debug!(stage = stage.as_str(), event = %name, ?fields, "build event");
        self.events.push(BuildEvent {
            stage,
            name,
            fields,
        });
    }

    #[must_use]
    pub fn events(&self) -> &[BuildEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<BuildEvent> {
        self.events
    }
}
