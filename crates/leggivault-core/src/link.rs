//! Link canonicalisation and identifying keys for cross-references.
//!
//! The vault refers to other acts through several URL shapes, all of which
//! are treated as opaque data and never fetched:
//!
//! - N2Ls resolver links: `https://www.normattiva.it/uri-res/N2Ls?urn:nir:stato:legge:2026-01-07;1`,
//!   optionally with a snapshot suffix such as `!vig=2026-01-10`
//! - detail pages: `https://www.normattiva.it/atto/caricaDettaglioAtto?atto.dataPubblicazioneGazzetta=2025-12-10&atto.codiceRedazionale=25G00185&...`
//! - Gazzetta Ufficiale ELI links: `https://www.gazzettaufficiale.it/eli/id/2026/01/07/25G00211/sg`
//!
//! The same act is routinely referenced at different "as amended on"
//! snapshots, so matching only looks at identifying components: snapshot and
//! session parameters are dropped, `http` and `https` compare equal, and the
//! remaining query parameters are sorted.

use std::collections::BTreeSet;

use url::Url;

use crate::LegislativeRecord;

/// Query parameters that select a snapshot or a UI session rather than an act.
pub const SNAPSHOT_PARAMS: &[&str] = &[
    "datavigenza",
    "vigenza",
    "qid",
    "tabid",
    "generatabid",
    "tipodettaglio",
    "title",
];

/// One identifying key of an act.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKey {
    /// Codice redazionale, upper-cased.
    Codice(String),
    /// `urn:nir:` identifier without snapshot suffixes, lower-cased.
    Urn(String),
    /// Canonical link form, see [`canonical_link`].
    Link(String),
}

/// Canonical string form of a link.
///
/// Input that does not parse as a URL is returned trimmed, with `&amp;`
/// decoded.
pub fn canonical_link(uri: &str) -> String {
    let decoded = uri.trim().replace("&amp;", "&");
    let Ok(mut url) = Url::parse(&decoded) else {
        return decoded;
    };

    if url.scheme() == "http" {
        // Both schemes are "special" so the switch cannot fail.
        let _ = url.set_scheme("https");
    }
    url.set_fragment(None);

    if let Some(query) = url.query().map(str::to_owned) {
        let mut kept: Vec<String> = query
            .split('&')
            .filter(|param| !param.is_empty())
            .filter_map(canonical_param)
            .collect();
        kept.sort();
        kept.dedup();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&kept.join("&")));
        }
    }

    url.to_string()
}

fn canonical_param(param: &str) -> Option<String> {
    if let Some(urn) = extract_urn(param) {
        return Some(urn);
    }
    let key = param.split_once('=').map_or(param, |(k, _)| k);
    let name = key.rsplit('.').next().unwrap_or(key).to_ascii_lowercase();
    if SNAPSHOT_PARAMS.contains(&name.as_str()) {
        None
    } else {
        Some(param.to_string())
    }
}

/// Extract a `urn:nir:` identifier, without snapshot (`!vig=`), version
/// (`@originale`) or partition (`~art3`) suffixes.
pub fn extract_urn(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("urn:nir:")?;
    let urn: String = lower[start..]
        .chars()
        .take_while(|&c| !matches!(c, '!' | '@' | '~' | '&' | '#' | '"' | '\'') && !c.is_whitespace())
        .collect();
    Some(urn)
}

/// Extract a codice redazionale from a link.
///
/// Recognises `codiceRedazionale=` / `codiceRedaz=` query parameters (with or
/// without an `atto.` prefix) and Gazzetta Ufficiale ELI paths.
pub fn extract_codice(uri: &str) -> Option<String> {
    let decoded = uri.replace("&amp;", "&");

    for part in decoded.split(['?', '&', '#']) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let name = key.rsplit('.').next().unwrap_or(key).to_ascii_lowercase();
        if name == "codiceredazionale" || name == "codiceredaz" {
            let value = value.trim();
            if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Some(value.to_ascii_uppercase());
            }
        }
    }

    // ELI: /eli/id/<yyyy>/<mm>/<dd>/<codice>/<serie>
    let (_, rest) = decoded.split_once("/eli/id/")?;
    let candidate = rest.split('/').nth(3)?;
    looks_like_codice(candidate).then(|| candidate.to_ascii_uppercase())
}

/// Two-digit year, one series letter, five digits: `25G00211`.
pub fn looks_like_codice(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 8
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[2].is_ascii_alphabetic()
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

/// Keys a reference URI can be matched by.
pub fn reference_keys(uri: &str) -> Vec<LinkKey> {
    let mut keys = vec![LinkKey::Link(canonical_link(uri))];
    if let Some(urn) = extract_urn(uri) {
        keys.push(LinkKey::Urn(urn));
    }
    if let Some(codice) = extract_codice(uri) {
        keys.push(LinkKey::Codice(codice));
    }
    keys
}

/// Keys identifying a record as a reference target.
pub fn record_keys(record: &LegislativeRecord) -> BTreeSet<LinkKey> {
    let mut keys = BTreeSet::new();
    keys.insert(LinkKey::Codice(
        record.codice_redazionale.trim().to_ascii_uppercase(),
    ));
    for link in record.external_links() {
        keys.insert(LinkKey::Link(canonical_link(link)));
        if let Some(urn) = extract_urn(link) {
            keys.insert(LinkKey::Urn(urn));
        }
        if let Some(codice) = extract_codice(link) {
            keys.insert(LinkKey::Codice(codice));
        }
    }
    if let Some(urn) = record.derived_urn() {
        keys.insert(LinkKey::Urn(urn));
    }
    keys
}
