/// Settings read by the content pipeline.
///
/// Callers take one copy per invocation; nothing in the pipeline mutates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Reorder certificates extracted from PKCS#12 containers as leaf to root
    pub construct_pem_chain: bool,
}

impl ProviderConfig {
    pub fn new(construct_pem_chain: bool) -> Self {
        Self {
            construct_pem_chain,
        }
    }
}
