use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::variation::Variation;

pub type NodeSelector = BTreeMap<String, String>;

/// Node selectors for worker builds, one per variation plus a platform
/// selector layered on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSelectors {
    #[serde(default)]
    pub platform: NodeSelector,
    #[serde(default)]
    pub scratch: NodeSelector,
    #[serde(default)]
    pub explicit: NodeSelector,
    #[serde(default)]
    pub auto: NodeSelector,
    #[serde(default)]
    pub isolated: NodeSelector,
}

impl NodeSelectors {
    /// Selector for a worker build of the given variation: the variation's
    /// selector with platform keys merged over it.
    pub fn resolve(&self, variation: Variation) -> NodeSelector {
        let base = match variation {
            Variation::Auto => &self.auto,
            Variation::Scratch => &self.scratch,
            Variation::Isolated => &self.isolated,
            Variation::None => &self.explicit,
        };

        let mut selector = base.clone();
        selector.extend(
            self.platform
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        selector
    }
}
