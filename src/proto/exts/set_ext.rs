use std::fmt;

use crate::proto::Set;

impl Set {
    /// Every partition, in the fixed order rounds are emitted in.
    pub const ALL: [Set; 3] = [
        Set::GlobalNodeInfos,
        Set::GlobalServiceInfos,
        Set::GlobalEndpointInfos,
    ];

    /// Label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Set::GlobalNodeInfos => "node_infos",
            Set::GlobalServiceInfos => "service_infos",
            Set::GlobalEndpointInfos => "endpoint_infos",
        }
    }
}

impl fmt::Display for Set {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}
