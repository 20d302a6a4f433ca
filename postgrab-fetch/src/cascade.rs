//! First-match-wins search over ordered candidates.
//!
//! The same utility serves CSS selector lists and embedded-JSON path lists:
//! candidates are probed in order and the first one that yields a value wins.
//! Later candidates are never probed once a match is found.

use futures::future::BoxFuture;

/// A successful cascade probe.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeHit<C, V> {
    /// Position of the matching candidate in the list.
    pub index: usize,
    /// The matching candidate.
    pub candidate: C,
    /// What the probe produced.
    pub value: V,
}

/// Returns the first candidate for which `probe` yields a value.
pub fn first_match<C, V, I, P>(candidates: I, mut probe: P) -> Option<CascadeHit<C, V>>
where
    I: IntoIterator<Item = C>,
    C: Copy,
    P: FnMut(C) -> Option<V>,
{
    candidates
        .into_iter()
        .enumerate()
        .find_map(|(index, candidate)| {
            probe(candidate).map(|value| CascadeHit {
                index,
                candidate,
                value,
            })
        })
}

/// Async variant of [`first_match`] for probes that talk to a browser.
///
/// Probes return boxed `Send` futures, which lets them borrow a shared session.
pub async fn first_match_async<'a, C, V, I, P>(
    candidates: I,
    mut probe: P,
) -> Option<CascadeHit<C, V>>
where
    I: IntoIterator<Item = C>,
    C: Copy,
    P: FnMut(C) -> BoxFuture<'a, Option<V>>,
{
    for (index, candidate) in candidates.into_iter().enumerate() {
        if let Some(value) = probe(candidate).await {
            return Some(CascadeHit {
                index,
                candidate,
                value,
            });
        }
    }
    None
}
