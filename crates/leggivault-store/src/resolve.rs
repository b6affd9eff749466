//! Cross-reference resolution over a point-in-time view of the index.
//!
//! Every `atti-aggiornati` / `atti-correlati` entry is reduced to identifying
//! keys (see [`leggivault_core::link`]) and looked up against the keys of all
//! indexed records. Only ordered maps and sets are used, so the same store
//! always yields the same resolution.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use leggivault_core::{LinkKey, Relation, extract_codice, record_keys, reference_keys};
use serde::Serialize;
use tracing::{debug, info};

use crate::IndexStore;

/// Resolved outbound links of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordLinks {
    /// Codici of indexed records this one references.
    pub matched: BTreeSet<String>,
    /// Reference URIs that match no indexed record, as written.
    pub dangling: BTreeSet<String>,
    /// Subset of `matched` reached through `atti-aggiornati`.
    pub amends: BTreeSet<String>,
}

impl RecordLinks {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.dangling.is_empty()
    }

    /// Matched targets with the relation that reached them. A target both
    /// amended and related is reported once, as amended.
    pub fn edges(&self) -> impl Iterator<Item = (&str, Relation)> {
        self.matched.iter().map(|target| {
            let relation = if self.amends.contains(target) {
                Relation::Amends
            } else {
                Relation::Relates
            };
            (target.as_str(), relation)
        })
    }
}

/// A reference that points outside the indexed corpus. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DanglingReferenceNotice {
    pub source: String,
    pub relation: Relation,
    pub uri: String,
    /// Codice redazionale named by the URI, when it carries one.
    pub codice: Option<String>,
}

/// Output of [`resolve`]: outbound links for every record plus the inbound
/// view and the dangling notices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    links: BTreeMap<String, RecordLinks>,
    inbound: BTreeMap<String, BTreeSet<String>>,
    notices: Vec<DanglingReferenceNotice>,
}

static NO_LINKS: RecordLinks = RecordLinks {
    matched: BTreeSet::new(),
    dangling: BTreeSet::new(),
    amends: BTreeSet::new(),
};

impl Resolution {
    /// Links of one record. Unknown codici get the empty set.
    pub fn get(&self, codice: &str) -> &RecordLinks {
        self.links
            .get(&codice.trim().to_ascii_uppercase())
            .unwrap_or(&NO_LINKS)
    }

    /// `(source, links)` for every indexed record, in codice order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordLinks)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn dangling(&self) -> impl Iterator<Item = &DanglingReferenceNotice> {
        self.notices.iter()
    }

    pub fn dangling_count(&self) -> usize {
        self.notices.len()
    }

    pub fn matched_count(&self) -> usize {
        self.links.values().map(|l| l.matched.len()).sum()
    }

    /// `(source, target, relation)` for every matched reference.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, Relation)> {
        self.links.iter().flat_map(|(source, links)| {
            links
                .edges()
                .map(move |(target, relation)| (source.as_str(), target, relation))
        })
    }

    /// Codici of records that reference `target`, in codice order.
    pub fn referenced_by(&self, target: &str) -> impl Iterator<Item = &str> {
        self.inbound
            .get(&target.trim().to_ascii_uppercase())
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Records reachable from `codice` within `max_hops` link traversals,
    /// following references in either direction, with their hop distance.
    /// The start record is not included.
    pub fn reachable_within(&self, codice: &str, max_hops: usize) -> BTreeMap<String, usize> {
        let start = codice.trim().to_ascii_uppercase();
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        let mut queue = VecDeque::from([(start.clone(), 0usize)]);

        while let Some((current, hop)) = queue.pop_front() {
            if hop == max_hops {
                continue;
            }
            let outbound = self.get(&current).matched.iter().map(String::as_str);
            let neighbours: Vec<&str> = outbound.chain(self.referenced_by(&current)).collect();
            for next in neighbours {
                if next == start || seen.contains_key(next) {
                    continue;
                }
                seen.insert(next.to_string(), hop + 1);
                queue.push_back((next.to_string(), hop + 1));
            }
        }
        seen
    }
}

/// Resolve every record's references against the records in `store`.
///
/// A reference matching some other record links to it. A reference whose
/// only match is its own record is ignored. Anything else is dangling.
pub fn resolve(store: &IndexStore) -> Resolution {
    let mut targets: BTreeMap<LinkKey, BTreeSet<String>> = BTreeMap::new();
    for record in store.list_all() {
        let codice = record.codice_redazionale.trim().to_ascii_uppercase();
        for key in record_keys(record) {
            targets.entry(key).or_default().insert(codice.clone());
        }
    }

    let mut resolution = Resolution::default();
    for record in store.list_all() {
        let source = record.codice_redazionale.trim().to_ascii_uppercase();
        let mut links = RecordLinks::default();

        for (relation, uri) in record.references() {
            let hits: BTreeSet<&String> = reference_keys(uri)
                .iter()
                .filter_map(|key| targets.get(key))
                .flatten()
                .collect();

            if hits.is_empty() {
                links.dangling.insert(uri.trim().to_string());
                resolution.notices.push(DanglingReferenceNotice {
                    source: source.clone(),
                    relation,
                    uri: uri.trim().to_string(),
                    codice: extract_codice(uri),
                });
                continue;
            }

            let mut any_other = false;
            for target in hits.into_iter().filter(|t| **t != source) {
                any_other = true;
                links.matched.insert(target.clone());
                if relation == Relation::Amends {
                    links.amends.insert(target.clone());
                }
                resolution
                    .inbound
                    .entry(target.clone())
                    .or_default()
                    .insert(source.clone());
            }
            if !any_other {
                debug!(codice = %source, uri = %uri, "ignoring self-reference");
            }
        }

        resolution.links.insert(source, links);
    }

    resolution.notices.sort();
    resolution.notices.dedup();

    info!(
        records = resolution.len(),
        matched = resolution.matched_count(),
        dangling = resolution.dangling_count(),
        "resolved cross-references"
    );
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use leggivault_core::{ActType, LegislativeRecord};

    fn detail(codice: &str, gu: &str) -> String {
        format!(
            "https://www.normattiva.it/atto/caricaDettaglioAtto?atto.dataPubblicazioneGazzetta={gu}&atto.codiceRedazionale={codice}&tipoDettaglio=multivigenza"
        )
    }

    fn record(codice: &str, numero: u32, day: u32) -> LegislativeRecord {
        LegislativeRecord::new(
            codice,
            ActType::Legge,
            numero,
            NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
        )
    }

    /// 26G00016 amends 25G00211 (present) and 25G00185 (absent), and relates
    /// to 26G00017 through a different snapshot of its N2Ls link.
    fn sample() -> IndexStore {
        let mut a = record("25G00211", 1, 5);
        a.normattiva_urn =
            Some("https://www.normattiva.it/uri-res/N2Ls?urn:nir:stato:legge:2026-01-05;1".into());

        let mut b = record("26G00016", 5, 12);
        b.atti_aggiornati = vec![detail("25G00185", "2025-12-10"), detail("25G00211", "2026-01-07")];
        b.atti_correlati = vec![
            "http://www.normattiva.it/uri-res/N2Ls?urn:nir:stato:legge:2026-01-20;9!vig=2026-02-01"
                .into(),
        ];

        let mut c = record("26G00017", 9, 20);
        c.normattiva_link =
            Some("https://www.normattiva.it/uri-res/N2Ls?urn:nir:stato:legge:2026-01-20;9".into());
        c.atti_correlati = vec![detail("26G00017", "2026-01-21")];

        let d = record("26G00020", 3, 22);

        let mut store = IndexStore::new();
        for r in [a, b, c, d] {
            store.insert(r).unwrap();
        }
        store
    }

    #[test]
    fn matched_and_dangling() {
        let store = sample();
        let res = resolve(&store);
        let links = res.get("26G00016");
        assert_eq!(
            links.matched,
            BTreeSet::from(["25G00211".to_string(), "26G00017".to_string()])
        );
        assert_eq!(links.amends, BTreeSet::from(["25G00211".to_string()]));
        assert_eq!(links.dangling.len(), 1);
        assert!(links.dangling.iter().next().unwrap().contains("25G00185"));
    }

    #[test]
    fn every_record_has_an_entry() {
        let res = resolve(&sample());
        assert_eq!(res.len(), 4);
        assert!(res.get("26G00020").is_empty());
        assert!(res.get("99X00000").is_empty());
    }

    #[test]
    fn self_reference_ignored() {
        let res = resolve(&sample());
        let links = res.get("26G00017");
        assert!(links.matched.is_empty());
        assert!(links.dangling.is_empty());
    }

    #[test]
    fn dangling_notice_names_codice() {
        let res = resolve(&sample());
        let notices: Vec<_> = res.dangling().collect();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].source, "26G00016");
        assert_eq!(notices[0].relation, Relation::Amends);
        assert_eq!(notices[0].codice.as_deref(), Some("25G00185"));
    }

    #[test]
    fn dangling_becomes_matched_once_target_arrives() {
        let mut store = sample();
        assert_eq!(resolve(&store).dangling_count(), 1);
        store.insert(record("25G00185", 180, 2)).unwrap();
        let res = resolve(&store);
        assert_eq!(res.dangling_count(), 0);
        assert!(res.get("26G00016").matched.contains("25G00185"));
    }

    #[test]
    fn inbound_and_edges() {
        let res = resolve(&sample());
        assert_eq!(res.referenced_by("25G00211").collect::<Vec<_>>(), vec!["26G00016"]);
        assert_eq!(res.referenced_by("26G00020").count(), 0);

        let edges: Vec<_> = res.edges().collect();
        assert_eq!(
            edges,
            vec![
                ("26G00016", "25G00211", Relation::Amends),
                ("26G00016", "26G00017", Relation::Relates),
            ]
        );
    }

    #[test]
    fn reachable_within_hops() {
        let res = resolve(&sample());
        let one = res.reachable_within("25G00211", 1);
        assert_eq!(one, BTreeMap::from([("26G00016".to_string(), 1)]));

        let two = res.reachable_within("25G00211", 2);
        assert_eq!(two.get("26G00017"), Some(&2));
        assert!(!two.contains_key("25G00211"));
        assert!(res.reachable_within("25G00211", 0).is_empty());
    }

    #[test]
    fn resolution_is_deterministic() {
        let store = sample();
        assert_eq!(resolve(&store), resolve(&store));
    }

    #[test]
    fn refresh_links_materialises() {
        let mut store = sample();
        let dangling = store.refresh_links().dangling_count();
        assert_eq!(dangling, 1);
        assert_eq!(store.links().map(Resolution::len), Some(4));
    }
}
