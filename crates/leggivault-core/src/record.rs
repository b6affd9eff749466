//! Typed legislative records produced by the parser.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Category of an act, from Normattiva's `denominazioneAtto` vocabulary.
///
/// Labels outside the known set are kept as [`ActType::Other`] so that new
/// categories in the vault never break ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ActType {
    Legge,
    LeggeCostituzionale,
    DecretoLegge,
    DecretoLegislativo,
    DecretoPresidenteRepubblica,
    DecretoPresidenteConsiglioMinistri,
    DecretoMinisteriale,
    Decreto,
    RegioDecreto,
    Regolamento,
    Ordinanza,
    Deliberazione,
    Costituzione,
    Other(String),
}

impl ActType {
    /// Parse a `tipo` label. Matching is case-insensitive and tolerant of
    /// surrounding whitespace.
    pub fn from_label(label: &str) -> Self {
        let upper = label.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match upper.as_str() {
            "LEGGE" => Self::Legge,
            "LEGGE COSTITUZIONALE" => Self::LeggeCostituzionale,
            "DECRETO-LEGGE" => Self::DecretoLegge,
            "DECRETO LEGISLATIVO" => Self::DecretoLegislativo,
            "DECRETO DEL PRESIDENTE DELLA REPUBBLICA" => Self::DecretoPresidenteRepubblica,
            "DECRETO DEL PRESIDENTE DEL CONSIGLIO DEI MINISTRI" => {
                Self::DecretoPresidenteConsiglioMinistri
            }
            "DECRETO MINISTERIALE" => Self::DecretoMinisteriale,
            "DECRETO" => Self::Decreto,
            "REGIO DECRETO" => Self::RegioDecreto,
            "REGOLAMENTO" => Self::Regolamento,
            "ORDINANZA" => Self::Ordinanza,
            "DELIBERAZIONE" => Self::Deliberazione,
            "COSTITUZIONE" => Self::Costituzione,
            _ => Self::Other(upper),
        }
    }

    /// Canonical label as written in the vault.
    pub fn label(&self) -> &str {
        match self {
            Self::Legge => "LEGGE",
            Self::LeggeCostituzionale => "LEGGE COSTITUZIONALE",
            Self::DecretoLegge => "DECRETO-LEGGE",
            Self::DecretoLegislativo => "DECRETO LEGISLATIVO",
            Self::DecretoPresidenteRepubblica => "DECRETO DEL PRESIDENTE DELLA REPUBBLICA",
            Self::DecretoPresidenteConsiglioMinistri => {
                "DECRETO DEL PRESIDENTE DEL CONSIGLIO DEI MINISTRI"
            }
            Self::DecretoMinisteriale => "DECRETO MINISTERIALE",
            Self::Decreto => "DECRETO",
            Self::RegioDecreto => "REGIO DECRETO",
            Self::Regolamento => "REGOLAMENTO",
            Self::Ordinanza => "ORDINANZA",
            Self::Deliberazione => "DELIBERAZIONE",
            Self::Costituzione => "COSTITUZIONE",
            Self::Other(label) => label,
        }
    }

    /// Segment used by Normattiva URNs (`urn:nir:stato:<segment>:...`).
    /// Historical types without their own variant are looked up by label.
    pub fn urn_segment(&self) -> Option<&'static str> {
        let label = self.label();
        URN_SEGMENTS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, segment)| *segment)
    }

    /// Short label used in human-facing citations.
    pub fn short_label(&self) -> &str {
        match self {
            Self::Legge => "Legge",
            Self::LeggeCostituzionale => "Legge cost.",
            Self::DecretoLegge => "D.L.",
            Self::DecretoLegislativo => "D.Lgs.",
            Self::DecretoPresidenteRepubblica => "DPR",
            Self::DecretoPresidenteConsiglioMinistri => "DPCM",
            Self::DecretoMinisteriale => "D.M.",
            Self::Decreto => "Decreto",
            Self::RegioDecreto => "R.D.",
            Self::Regolamento => "Regolamento",
            Self::Ordinanza => "Ordinanza",
            Self::Deliberazione => "Deliberazione",
            Self::Costituzione => "Costituzione",
            Self::Other(label) => label,
        }
    }
}

/// `denominazioneAtto` label to Normattiva URN segment.
const URN_SEGMENTS: &[(&str, &str)] = &[
    ("COSTITUZIONE", "costituzione"),
    ("DECRETO", "decreto"),
    ("DECRETO DEL CAPO DEL GOVERNO", "decreto:capo:governo"),
    (
        "DECRETO DEL CAPO DEL GOVERNO, PRIMO MINISTRO SEGRETARIO DI STATO",
        "decreto:capo:governo:primo-ministro-segretario-di-stato",
    ),
    ("DECRETO DEL CAPO PROVVISORIO DELLO STATO", "decreto:capo-provvisorio:stato"),
    ("DECRETO DEL DUCE", "decreto:duce"),
    (
        "DECRETO DEL DUCE DEL FASCISMO, CAPO DEL GOVERNO",
        "decreto:duce:fascismo:capo:governo",
    ),
    (
        "DECRETO DEL PRESIDENTE DEL CONSIGLIO DEI MINISTRI",
        "decreto:presidente:consiglio-dei-ministri",
    ),
    ("DECRETO DEL PRESIDENTE DELLA REPUBBLICA", "decreto:presidente:repubblica"),
    ("DECRETO-LEGGE", "decreto-legge"),
    ("DECRETO-LEGGE LUOGOTENENZIALE", "decreto-legge-luogotenenziale"),
    ("DECRETO LEGISLATIVO", "decreto-legislativo"),
    (
        "DECRETO LEGISLATIVO DEL CAPO PROVVISORIO DELLO STATO",
        "decreto-legislativo:capo-provvisorio:stato",
    ),
    ("DECRETO LEGISLATIVO LUOGOTENENZIALE", "decreto-legislativo-luogotenenziale"),
    ("DECRETO LEGISLATIVO PRESIDENZIALE", "decreto-legislativo-presidenziale"),
    ("DECRETO LUOGOTENENZIALE", "decreto-luogotenenziale"),
    ("DECRETO MINISTERIALE", "decreto-ministeriale"),
    ("DECRETO PRESIDENZIALE", "decreto-presidenziale"),
    ("DECRETO REALE", "decreto-reale"),
    ("DELIBERAZIONE", "deliberazione"),
    (
        "DETERMINAZIONE DEL COMMISSARIO PER LE FINANZE",
        "determinazione:commissario:finanze",
    ),
    (
        "DETERMINAZIONE DEL COMMISSARIO PER LA PRODUZIONE BELLICA",
        "determinazione:commissario:produzione-bellica",
    ),
    ("DETERMINAZIONE INTERCOMMISSARIALE", "determinazione-intercommissariale"),
    ("LEGGE", "legge"),
    ("LEGGE COSTITUZIONALE", "legge-costituzionale"),
    ("ORDINANZA", "ordinanza"),
    ("REGIO DECRETO", "regio-decreto"),
    ("REGIO DECRETO-LEGGE", "regio-decreto-legge"),
    ("REGIO DECRETO LEGISLATIVO", "regio-decreto-legislativo"),
    ("REGOLAMENTO", "regolamento"),
];

impl fmt::Display for ActType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for ActType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<ActType> for String {
    fn from(tipo: ActType) -> Self {
        tipo.label().to_string()
    }
}

/// Direction-free classification of an outbound reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Listed under `atti-aggiornati`: this act amends the target.
    Amends,
    /// Listed under `atti-correlati`.
    Relates,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amends => "amends",
            Self::Relates => "relates",
        }
    }
}

/// A bill sponsor (`firmatario`) with an optional role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sponsor {
    pub nome: String,
    pub ruolo: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl fmt::Display for Sponsor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ruolo {
            Some(ruolo) => write!(f, "{} ({})", self.nome, ruolo),
            None => f.write_str(&self.nome),
        }
    }
}

/// Chamber of Deputies provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraProvenance {
    pub origine: Option<String>,
    pub numero: Option<String>,
    pub legislatura: Option<u32>,
    pub firmatari: Vec<Sponsor>,
    pub argomenti: BTreeSet<String>,
    pub documenti: Vec<String>,
    /// Link to the final vote record.
    pub votazione_finale: Option<String>,
    /// Unrecognised keys of the `camera` block, kept verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Senate provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenatoProvenance {
    pub origine: Option<String>,
    pub numero: Option<String>,
    pub legislatura: Option<u32>,
    pub firmatari: Vec<Sponsor>,
    pub argomenti: BTreeSet<String>,
    pub documenti: Vec<String>,
    /// TESEO topic taxonomy labels.
    pub teseo: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// One law, as described by a single front-matter block.
///
/// Immutable once inserted into an index; cross-reference links are derived
/// separately and never stored on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegislativeRecord {
    pub codice_redazionale: String,
    pub tipo: ActType,
    pub numero_atto: u32,
    pub data_emanazione: NaiveDate,
    pub data_gu: Option<NaiveDate>,
    pub data_vigenza: Option<NaiveDate>,
    pub numero_gu: Option<u32>,
    pub normattiva_urn: Option<String>,
    pub normattiva_link: Option<String>,
    pub gu_link: Option<String>,
    pub titolo_atto: Option<String>,
    pub descrizione_atto: Option<String>,
    pub titolo_alternativo: Option<String>,
    pub atti_aggiornati: Vec<String>,
    pub atti_correlati: Vec<String>,
    pub lavori_preparatori: Vec<String>,
    pub aggiornamenti_atto: Vec<String>,
    pub note_atto: Vec<String>,
    pub relazioni: Vec<String>,
    pub aggiornamenti_titolo: Vec<String>,
    pub aggiornamenti_struttura: Vec<String>,
    pub atti_parlamentari: Vec<String>,
    pub atti_attuativi: Vec<String>,
    pub camera: Option<CameraProvenance>,
    pub senato: Option<SenatoProvenance>,
    /// Keys the parser does not know, kept verbatim.
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl LegislativeRecord {
    /// Minimal record with only the required fields set.
    pub fn new(
        codice_redazionale: impl Into<String>,
        tipo: ActType,
        numero_atto: u32,
        data_emanazione: NaiveDate,
    ) -> Self {
        Self {
            codice_redazionale: codice_redazionale.into(),
            tipo,
            numero_atto,
            data_emanazione,
            data_gu: None,
            data_vigenza: None,
            numero_gu: None,
            normattiva_urn: None,
            normattiva_link: None,
            gu_link: None,
            titolo_atto: None,
            descrizione_atto: None,
            titolo_alternativo: None,
            atti_aggiornati: Vec::new(),
            atti_correlati: Vec::new(),
            lavori_preparatori: Vec::new(),
            aggiornamenti_atto: Vec::new(),
            note_atto: Vec::new(),
            relazioni: Vec::new(),
            aggiornamenti_titolo: Vec::new(),
            aggiornamenti_struttura: Vec::new(),
            atti_parlamentari: Vec::new(),
            atti_attuativi: Vec::new(),
            camera: None,
            senato: None,
            extra: BTreeMap::new(),
        }
    }

    /// Enactment year.
    pub fn year(&self) -> i32 {
        self.data_emanazione.year()
    }

    /// Human-facing citation, e.g. `Legge n. 9/26`.
    pub fn citation(&self) -> String {
        format!(
            "{} n. {}/{:02}",
            self.tipo.short_label(),
            self.numero_atto,
            self.year().rem_euclid(100)
        )
    }

    /// URN derived from type, enactment date and number, when the type has a
    /// known URN segment.
    pub fn derived_urn(&self) -> Option<String> {
        let segment = self.tipo.urn_segment()?;
        Some(format!(
            "urn:nir:stato:{}:{};{}",
            segment,
            self.data_emanazione.format("%Y-%m-%d"),
            self.numero_atto
        ))
    }

    /// Outbound references in declaration order: `atti-aggiornati` first,
    /// then `atti-correlati`.
    pub fn references(&self) -> impl Iterator<Item = (Relation, &str)> {
        let amends = self
            .atti_aggiornati
            .iter()
            .map(|uri| (Relation::Amends, uri.as_str()));
        let relates = self
            .atti_correlati
            .iter()
            .map(|uri| (Relation::Relates, uri.as_str()));
        amends.chain(relates)
    }

    /// External identifiers present on the record.
    pub fn external_links(&self) -> impl Iterator<Item = &str> {
        [&self.normattiva_link, &self.normattiva_urn, &self.gu_link]
            .into_iter()
            .filter_map(|link| link.as_deref())
    }
}
