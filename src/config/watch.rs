use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Operations buffered per subscriber before the session waits on the
    /// client. Must be at least 1.
    #[serde(default = "default_response_buffer_size")]
    pub response_buffer_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            response_buffer_size: default_response_buffer_size(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.response_buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "response_buffer_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_response_buffer_size() -> usize {
    64
}
