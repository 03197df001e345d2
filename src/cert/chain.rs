use crate::cert::parser::{CertificateIdentity, CertificateParser};
use crate::utils::errors::{ProviderError, Result};
use crate::utils::pem::{encode_blocks, pem_block, CERTIFICATE_TAG};
use pem::Pem;
use std::collections::HashMap;

/// Certificates ordered from the leaf up to the root or topmost issuer
#[derive(Debug, Clone)]
pub struct CertificateChain {
    certificates: Vec<CertificateIdentity>,
}

impl CertificateChain {
    pub fn certificates(&self) -> &[CertificateIdentity] {
        &self.certificates
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn leaf(&self) -> Option<&CertificateIdentity> {
        self.certificates.first()
    }

    /// Header-free CERTIFICATE blocks in chain order
    pub fn to_pem_blocks(&self) -> Vec<Pem> {
        self.certificates
            .iter()
            .map(|cert| pem_block(CERTIFICATE_TAG, cert.der.clone()))
            .collect()
    }

    pub fn to_pem(&self) -> String {
        encode_blocks(&self.to_pem_blocks())
    }
}

/// Order an unordered set of certificates as leaf, intermediates, root.
///
/// A certificate's parent is the first other certificate, in input order, whose
/// subject key identifier equals its authority key identifier. The leaf is the
/// first certificate that is nobody's parent.
///
/// A certificate without a subject key identifier is never anyone's parent,
/// and one without an authority key identifier has no parent and ends the
/// chain. Two certificates that both lack identifiers are unrelated.
pub fn assemble_chain(blocks: &[Pem]) -> Result<CertificateChain> {
    let nodes = blocks
        .iter()
        .map(CertificateParser::parse_block)
        .collect::<Result<Vec<_>>>()?;

    let mut by_subject_key_id: HashMap<&[u8], Vec<usize>> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        if let Some(ski) = node.subject_key_id.as_deref() {
            by_subject_key_id.entry(ski).or_default().push(idx);
        }
    }

    let mut parent: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut is_parent = vec![false; nodes.len()];
    for (idx, node) in nodes.iter().enumerate() {
        let Some(aki) = node.authority_key_id.as_deref() else {
            continue;
        };
        let issuer = by_subject_key_id
            .get(aki)
            .and_then(|candidates| candidates.iter().copied().find(|&j| j != idx));
        if let Some(issuer) = issuer {
            tracing::debug!(
                "certificate '{}' is issued by '{}'",
                node.subject,
                nodes[issuer].subject
            );
            parent[idx] = Some(issuer);
            is_parent[issuer] = true;
        }
    }

    let mut leaves = (0..nodes.len()).filter(|&idx| !is_parent[idx]);
    let leaf = leaves.next().ok_or(ProviderError::NoLeafFound)?;
    let others = leaves.count();
    if others > 0 {
        tracing::warn!(
            "found {} leaf candidates, using '{}'",
            others + 1,
            nodes[leaf].subject
        );
    }

    let mut order = Vec::with_capacity(nodes.len());
    let mut current = Some(leaf);
    while let Some(idx) = current {
        if order.len() >= nodes.len() {
            return Err(ProviderError::CycleDetected);
        }
        order.push(idx);
        current = parent[idx];
    }

    tracing::info!(
        "assembled certificate chain of {} from {} certificates",
        order.len(),
        nodes.len()
    );

    let mut slots: Vec<Option<CertificateIdentity>> = nodes.into_iter().map(Some).collect();
    let certificates = order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect();
    Ok(CertificateChain { certificates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::pem::parse_blocks;

    const ROOT: &str = include_str!("../../tests/fixtures/root.pem");
    const INTERMEDIATE: &str = include_str!("../../tests/fixtures/intermediate.pem");
    const LEAF: &str = include_str!("../../tests/fixtures/leaf.pem");
    const CYCLE_X: &str = include_str!("../../tests/fixtures/cycle_x.pem");
    const CYCLE_Y: &str = include_str!("../../tests/fixtures/cycle_y.pem");
    const CYCLE_LEAF: &str = include_str!("../../tests/fixtures/cycle_leaf.pem");
    const NO_KEY_IDS_A: &str = include_str!("../../tests/fixtures/no_key_ids_a.pem");
    const NO_KEY_IDS_B: &str = include_str!("../../tests/fixtures/no_key_ids_b.pem");

    fn block(pem_text: &str) -> Pem {
        parse_blocks(pem_text).unwrap().remove(0)
    }

    fn subjects(chain: &CertificateChain) -> Vec<&str> {
        chain
            .certificates()
            .iter()
            .map(|cert| cert.subject.as_str())
            .collect()
    }

    #[test]
    fn test_every_permutation_yields_leaf_to_root() {
        let (leaf, intermediate, root) = (block(LEAF), block(INTERMEDIATE), block(ROOT));
        let permutations = [
            [&leaf, &intermediate, &root],
            [&leaf, &root, &intermediate],
            [&intermediate, &leaf, &root],
            [&intermediate, &root, &leaf],
            [&root, &leaf, &intermediate],
            [&root, &intermediate, &leaf],
        ];

        for input in permutations {
            let blocks: Vec<Pem> = input.into_iter().cloned().collect();
            let chain = assemble_chain(&blocks).unwrap();
            assert_eq!(
                subjects(&chain),
                ["leaf.example.com", "Example Intermediate CA", "Example Root CA"]
            );
            assert_eq!(chain.to_pem_blocks()[0].contents(), leaf.contents());
            assert_eq!(chain.to_pem_blocks()[2].contents(), root.contents());
        }
    }

    #[test]
    fn test_lone_self_signed_root() {
        let chain = assemble_chain(&[block(ROOT)]).unwrap();
        assert_eq!(subjects(&chain), ["Example Root CA"]);
    }

    #[test]
    fn test_partial_chain_stops_at_topmost_issuer() {
        let chain = assemble_chain(&[block(INTERMEDIATE), block(LEAF)]).unwrap();
        assert_eq!(subjects(&chain), ["leaf.example.com", "Example Intermediate CA"]);
    }

    #[test]
    fn test_output_is_header_free_pem() {
        let chain = assemble_chain(&[block(ROOT), block(LEAF), block(INTERMEDIATE)]).unwrap();
        let text = chain.to_pem();
        assert_eq!(text.matches("-----BEGIN CERTIFICATE-----").count(), 3);
        assert!(!text.contains(": "));
        assert!(!text.contains("\r\n"));
    }

    #[test]
    fn test_missing_key_identifiers_never_link() {
        let chain = assemble_chain(&[block(NO_KEY_IDS_A), block(NO_KEY_IDS_B)]).unwrap();
        assert_eq!(subjects(&chain), ["No Key Ids A"]);
    }

    #[test]
    fn test_mutual_pair_has_no_leaf() {
        assert!(matches!(
            assemble_chain(&[block(CYCLE_X), block(CYCLE_Y)]),
            Err(ProviderError::NoLeafFound)
        ));
    }

    #[test]
    fn test_walk_into_cycle_is_detected() {
        for blocks in [
            [block(CYCLE_LEAF), block(CYCLE_X), block(CYCLE_Y)],
            [block(CYCLE_Y), block(CYCLE_X), block(CYCLE_LEAF)],
        ] {
            assert!(matches!(
                assemble_chain(&blocks),
                Err(ProviderError::CycleDetected)
            ));
        }
    }

    #[test]
    fn test_multiple_leaves_picks_first() {
        let chain = assemble_chain(&[block(CYCLE_LEAF), block(ROOT)]).unwrap();
        assert_eq!(subjects(&chain), ["cycle-leaf.example.com"]);
    }

    #[test]
    fn test_empty_set_has_no_leaf() {
        assert!(matches!(assemble_chain(&[]), Err(ProviderError::NoLeafFound)));
    }

    #[test]
    fn test_unparseable_certificate() {
        let garbage = pem_block(CERTIFICATE_TAG, b"garbage".to_vec());
        assert!(matches!(
            assemble_chain(&[block(ROOT), garbage]),
            Err(ProviderError::Parse(_))
        ));
    }
}
