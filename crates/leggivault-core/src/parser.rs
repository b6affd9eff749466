//! Record parser: one front-matter mapping in, one typed record out.
//!
//! Required fields are `codice-redazionale`, `tipo`, `numero-atto` and
//! `data-emanazione`. A record missing any of them, or carrying a malformed
//! value for any typed field, is rejected as a whole. Keys are matched after
//! normalisation to kebab-case, so `codiceRedazionale` and
//! `codice_redazionale` both mean `codice-redazionale`. Keys the parser does
//! not know land in [`LegislativeRecord::extra`] under their original
//! spelling.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};

use chrono::{Datelike, NaiveDate};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ConsistencyWarning, ValidationError};
use crate::frontmatter::MetadataBlock;
use crate::record::{ActType, CameraProvenance, LegislativeRecord, SenatoProvenance, Sponsor};

/// Fixed textual date format of the vault.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A successfully parsed block plus any soft findings about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub record: LegislativeRecord,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Parse one raw block: YAML decode, field validation, consistency checks
/// against the block's folder.
pub fn parse_block(block: &MetadataBlock) -> Result<ParsedRecord, ValidationError> {
    let value: Value = serde_yaml::from_str(&block.yaml)?;
    let Value::Mapping(mut mapping) = value else {
        return Err(ValidationError::NotAMapping);
    };
    restore_raw_codice(&mut mapping, &block.yaml);
    let record = parse_mapping(&mapping)?;
    let warnings = check_consistency(&record, block.origin.path());
    debug!(
        codice = %record.codice_redazionale,
        origin = %block.origin,
        warnings = warnings.len(),
        "parsed block"
    );
    Ok(ParsedRecord { record, warnings })
}

/// Unquoted codici of some series read as numbers in YAML (`26E00001` is a
/// float). Put the literal text from the block back in their place.
fn restore_raw_codice(mapping: &mut Mapping, yaml: &str) {
    for (key, value) in mapping.iter_mut() {
        let is_codice = scalar_text(key).is_some_and(|k| canonical_key(&k) == "codice-redazionale");
        if !is_codice || !value.is_number() {
            continue;
        }
        if let Some(raw) = raw_top_level_scalar(yaml, "codice-redazionale") {
            debug!(codice = %raw, "codice read as a number, using its literal text");
            *value = Value::String(raw);
        }
    }
}

/// Literal text after `key:` on a top-level line of the block.
fn raw_top_level_scalar(yaml: &str, canonical: &str) -> Option<String> {
    yaml.lines()
        .filter(|line| !line.starts_with([' ', '\t', '#', '-']))
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| canonical_key(key.trim_matches(['"', '\''])) == canonical)
        .map(|(_, rest)| rest.split(" #").next().unwrap_or(rest).trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Build a record from an already-decoded front-matter mapping.
pub fn parse_mapping(mapping: &Mapping) -> Result<LegislativeRecord, ValidationError> {
    let mut fields = Fields::from_mapping(mapping, "")?;

    let codice = fields.required("codice-redazionale", |f, v| {
        let codice = strict_string(f, v)?;
        Ok(codice.to_ascii_uppercase())
    })?;
    let tipo = fields.required("tipo", |f, v| Ok(ActType::from_label(&strict_string(f, v)?)))?;
    let numero_atto = fields.required("numero-atto", uint)?;
    let data_emanazione = fields.required("data-emanazione", date)?;

    let mut record = LegislativeRecord::new(codice, tipo, numero_atto, data_emanazione);
    record.data_gu = fields.optional("data-gu", date)?;
    record.data_vigenza = fields.optional("data-vigenza", date)?;
    record.numero_gu = fields.optional("numero-gu", uint)?;
    record.normattiva_urn = fields.optional_text("normattiva-urn")?;
    record.normattiva_link = fields.optional_text("normattiva-link")?;
    record.gu_link = fields.optional_text("gu-link")?;
    record.titolo_atto = fields.optional_text("titolo-atto")?;
    record.descrizione_atto = fields.optional_text("descrizione-atto")?;
    record.titolo_alternativo = fields.optional_text("titolo-alternativo")?;

    record.atti_aggiornati = fields.list("atti-aggiornati")?;
    record.atti_correlati = fields.list("atti-correlati")?;
    record.lavori_preparatori = fields.list("lavori-preparatori")?;
    record.aggiornamenti_atto = fields.list("aggiornamenti-atto")?;
    record.note_atto = fields.list("note-atto")?;
    record.relazioni = fields.list("relazioni")?;
    record.aggiornamenti_titolo = fields.list("aggiornamenti-titolo")?;
    record.aggiornamenti_struttura = fields.list("aggiornamenti-struttura")?;
    record.atti_parlamentari = fields.list("atti-parlamentari")?;
    record.atti_attuativi = fields.list("atti-attuativi")?;

    record.camera = fields.optional("camera", parse_camera)?;
    record.senato = fields.optional("senato", parse_senato)?;

    record.extra = fields.into_extra();
    Ok(record)
}

fn parse_camera(field: &str, value: Value) -> Result<CameraProvenance, ValidationError> {
    let mut fields = Fields::from_value(field, value)?;
    let camera = CameraProvenance {
        origine: fields.optional_text("origine")?,
        numero: fields.optional_text("numero")?,
        legislatura: fields.optional("legislatura", uint)?,
        firmatari: fields.optional("firmatari", sponsors)?.unwrap_or_default(),
        argomenti: fields.set("argomenti")?,
        documenti: fields.list("documenti")?,
        votazione_finale: fields.optional_text("votazione-finale")?,
        extra: fields.into_extra(),
    };
    Ok(camera)
}

fn parse_senato(field: &str, value: Value) -> Result<SenatoProvenance, ValidationError> {
    let mut fields = Fields::from_value(field, value)?;
    let senato = SenatoProvenance {
        origine: fields.optional_text("origine")?,
        numero: fields.optional_text("numero")?,
        legislatura: fields.optional("legislatura", uint)?,
        firmatari: fields.optional("firmatari", sponsors)?.unwrap_or_default(),
        argomenti: fields.set("argomenti")?,
        documenti: fields.list("documenti")?,
        teseo: fields.set("teseo")?,
        extra: fields.into_extra(),
    };
    Ok(senato)
}

// ── Field access ──

/// Remaining keys of a mapping, indexed by their kebab-case form.
struct Fields {
    prefix: String,
    entries: BTreeMap<String, (String, Value)>,
}

impl Fields {
    fn from_mapping(mapping: &Mapping, prefix: &str) -> Result<Self, ValidationError> {
        let mut entries = BTreeMap::new();
        for (key, value) in mapping {
            let original = scalar_text(key).ok_or_else(|| {
                ValidationError::malformed(
                    format!("{prefix}<key>"),
                    "mapping keys must be scalars",
                )
            })?;
            let canonical = canonical_key(&original);
            if entries.contains_key(&canonical) {
                return Err(ValidationError::malformed(
                    format!("{prefix}{original}"),
                    "field given more than once",
                ));
            }
            entries.insert(canonical, (original, value.clone()));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            entries,
        })
    }

    fn from_value(field: &str, value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Mapping(mapping) => Self::from_mapping(&mapping, &format!("{field}.")),
            other => Err(ValidationError::malformed(
                field,
                format!("expected a mapping, found {}", kind(&other)),
            )),
        }
    }

    /// Remove a key; null values count as absent.
    fn take(&mut self, key: &str) -> Option<Value> {
        self.entries
            .remove(key)
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }

    fn name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn required<T>(
        &mut self,
        key: &'static str,
        convert: impl FnOnce(&str, Value) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let value = self
            .take(key)
            .ok_or(ValidationError::MissingField { field: key })?;
        convert(key, value)
    }

    fn optional<T>(
        &mut self,
        key: &str,
        convert: impl FnOnce(&str, Value) -> Result<T, ValidationError>,
    ) -> Result<Option<T>, ValidationError> {
        let name = self.name(key);
        self.take(key).map(|value| convert(&name, value)).transpose()
    }

    fn optional_text(&mut self, key: &str) -> Result<Option<String>, ValidationError> {
        Ok(self.optional(key, text)?.filter(|s| !s.is_empty()))
    }

    fn list(&mut self, key: &str) -> Result<Vec<String>, ValidationError> {
        Ok(self.optional(key, string_list)?.unwrap_or_default())
    }

    fn set(&mut self, key: &str) -> Result<BTreeSet<String>, ValidationError> {
        Ok(self.list(key)?.into_iter().collect())
    }

    fn into_extra(self) -> BTreeMap<String, Value> {
        self.entries.into_values().collect()
    }
}

/// Normalise a field name to kebab-case: `codiceRedazionale`,
/// `codice_redazionale` and `codice-redazionale` all map to the last form.
pub fn canonical_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for c in key.trim().chars() {
        if matches!(c, '-' | '_' | ' ') {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            prev_lower = false;
        } else if c.is_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

// ── Value conversions ──

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A non-empty YAML string. Numbers are refused so that identifiers YAML
/// would read as floats (`26E00001`) fail loudly instead of being mangled.
fn strict_string(field: &str, value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::String(_) => Err(ValidationError::malformed(field, "empty string")),
        other => Err(ValidationError::malformed(
            field,
            format!("expected a string, found {} (quote the value)", kind(&other)),
        )),
    }
}

fn text(field: &str, value: Value) -> Result<String, ValidationError> {
    scalar_text(&value)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            ValidationError::malformed(field, format!("expected text, found {}", kind(&value)))
        })
}

fn uint(field: &str, value: Value) -> Result<u32, ValidationError> {
    let parsed = match &value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    };
    parsed.ok_or_else(|| {
        ValidationError::malformed(
            field,
            format!("expected a non-negative integer, found {}", kind(&value)),
        )
    })
}

fn date(field: &str, value: Value) -> Result<NaiveDate, ValidationError> {
    let Value::String(s) = &value else {
        return Err(ValidationError::malformed(
            field,
            format!("expected a YYYY-MM-DD date, found {}", kind(&value)),
        ));
    };
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|err| {
        ValidationError::malformed(field, format!("`{}` is not a YYYY-MM-DD date: {err}", s.trim()))
    })
}

/// Ordered list of strings. A lone scalar counts as a one-item list; blank
/// items are dropped.
fn string_list(field: &str, value: Value) -> Result<Vec<String>, ValidationError> {
    let items = match value {
        Value::Sequence(items) => items,
        Value::Null => Vec::new(),
        scalar @ (Value::String(_) | Value::Number(_)) => vec![scalar],
        other => {
            return Err(ValidationError::malformed(
                field,
                format!("expected a list, found {}", kind(&other)),
            ));
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        if item.is_null() {
            continue;
        }
        let s = scalar_text(&item).ok_or_else(|| {
            ValidationError::malformed(
                format!("{field}[{i}]"),
                format!("expected text, found {}", kind(&item)),
            )
        })?;
        let s = s.trim();
        if !s.is_empty() {
            out.push(s.to_string());
        }
    }
    Ok(out)
}

fn sponsors(field: &str, value: Value) -> Result<Vec<Sponsor>, ValidationError> {
    let items = match value {
        Value::Sequence(items) => items,
        single @ (Value::String(_) | Value::Mapping(_)) => vec![single],
        other => {
            return Err(ValidationError::malformed(
                field,
                format!("expected a list of sponsors, found {}", kind(&other)),
            ));
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let name = format!("{field}[{i}]");
        match item {
            Value::String(nome) if !nome.trim().is_empty() => out.push(Sponsor {
                nome: nome.trim().to_string(),
                ..Default::default()
            }),
            Value::Mapping(mapping) => {
                let mut fields = Fields::from_mapping(&mapping, &format!("{name}."))?;
                let nome = fields
                    .optional_text("nome")?
                    .ok_or_else(|| ValidationError::malformed(format!("{name}.nome"), "missing"))?;
                let ruolo = fields.optional_text("ruolo")?;
                out.push(Sponsor {
                    nome,
                    ruolo,
                    extra: fields.into_extra(),
                });
            }
            other => {
                return Err(ValidationError::malformed(
                    name,
                    format!("expected a name or a nome/ruolo mapping, found {}", kind(&other)),
                ));
            }
        }
    }
    Ok(out)
}

// ── Consistency checks ──

/// Date and number encoded in a vault folder path: `YYYY/MM[/DD]/<numero>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderHint {
    pub year: i32,
    pub month: u32,
    pub day: Option<u32>,
    pub numero: Option<u32>,
}

impl FolderHint {
    /// Read the hint from the directories containing `path`.
    ///
    /// The last `YYYY/MM` pair of directory segments anchors the hint. One
    /// further numeric segment is the act number; two are day and number.
    pub fn from_path(path: &Path) -> Option<Self> {
        let dirs: Vec<&str> = path
            .parent()?
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        let is_year = |s: &str| s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit());
        let as_month = |s: &str| {
            (s.len() <= 2 && s.bytes().all(|b| b.is_ascii_digit()))
                .then(|| s.parse::<u32>().ok())
                .flatten()
                .filter(|m| (1..=12).contains(m))
        };

        let anchor = (0..dirs.len().saturating_sub(1))
            .rev()
            .find(|&i| is_year(dirs[i]) && as_month(dirs[i + 1]).is_some())?;
        let year = dirs[anchor].parse().ok()?;
        let month = as_month(dirs[anchor + 1])?;

        let rest: Vec<u32> = dirs[anchor + 2..]
            .iter()
            .map_while(|s| {
                if s.bytes().all(|b| b.is_ascii_digit()) {
                    s.parse().ok()
                } else {
                    None
                }
            })
            .collect();

        let (day, numero) = match rest.as_slice() {
            [] => (None, None),
            [numero] => (None, Some(*numero)),
            [day, numero, ..] => (Some(*day), Some(*numero)),
        };

        Some(Self {
            year,
            month,
            day,
            numero,
        })
    }

    fn folder(&self) -> String {
        match self.day {
            Some(day) => format!("{}/{:02}/{:02}", self.year, self.month, day),
            None => format!("{}/{:02}", self.year, self.month),
        }
    }
}

const MESI: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

/// Enactment date spelled out in a vault file name, as in
/// `LEGGE 20 gennaio 2026, n. 9.md` or `DECRETO 1° marzo 2026, n. 2.md`.
pub fn file_name_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let words: Vec<&str> = stem.split_whitespace().collect();
    words.windows(3).find_map(|w| {
        let day = w[0].trim_end_matches(['°', 'º']).parse().ok()?;
        let month = MESI.iter().position(|m| w[1].eq_ignore_ascii_case(m))? as u32 + 1;
        let year = w[2].trim_end_matches([',', '.']).parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Soft checks that never reject a record: folder path and file name against
/// `data-emanazione` / `numero-atto`, and the expected ordering
/// `data-emanazione <= data-gu <= data-vigenza`.
pub fn check_consistency(
    record: &LegislativeRecord,
    path: Option<&Path>,
) -> Vec<ConsistencyWarning> {
    let mut warnings = Vec::new();
    let codice = &record.codice_redazionale;

    if let Some(hint) = path.and_then(FolderHint::from_path) {
        let d = record.data_emanazione;
        let date_ok = hint.year == d.year()
            && hint.month == d.month()
            && hint.day.is_none_or(|day| day == d.day());
        if !date_ok {
            warnings.push(ConsistencyWarning::FolderDate {
                codice: codice.clone(),
                folder: hint.folder(),
                data_emanazione: d,
            });
        }
        if let Some(numero) = hint.numero
            && numero != record.numero_atto
        {
            warnings.push(ConsistencyWarning::FolderNumber {
                codice: codice.clone(),
                folder: numero,
                numero_atto: record.numero_atto,
            });
        }
    }

    if let Some(file_date) = path.and_then(file_name_date)
        && file_date != record.data_emanazione
    {
        warnings.push(ConsistencyWarning::FileNameDate {
            codice: codice.clone(),
            file_date,
            data_emanazione: record.data_emanazione,
        });
    }

    let ordered = [
        ("data-emanazione", Some(record.data_emanazione)),
        ("data-gu", record.data_gu),
        ("data-vigenza", record.data_vigenza),
    ];
    let present: Vec<(&'static str, NaiveDate)> = ordered
        .into_iter()
        .filter_map(|(name, d)| d.map(|d| (name, d)))
        .collect();
    for pair in present.windows(2) {
        let (earlier, a) = pair[0];
        let (later, b) = pair[1];
        if a > b {
            warnings.push(ConsistencyWarning::DateOrder {
                codice: codice.clone(),
                earlier,
                later,
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::BlockOrigin;

    const FULL: &str = r#"
codice-redazionale: 26G00016
tipo: LEGGE
numero-atto: 5
data-emanazione: 2026-01-12
data-gu: 2026-01-14
data-vigenza: 2026-01-15
numero-gu: 10
normattiva-urn: https://www.normattiva.it/uri-res/N2Ls?urn:nir:stato:legge:2026-01-12;5
gu-link: https://www.gazzettaufficiale.it/eli/id/2026/01/14/26G00016/sg
titolo-atto: "Disposizioni in materia di semplificazione normativa"
descrizione-atto: "LEGGE 12 gennaio 2026, n. 5"
atti-aggiornati:
  - https://www.normattiva.it/atto/caricaDettaglioAtto?atto.dataPubblicazioneGazzetta=2025-12-10&atto.codiceRedazionale=25G00185
  - https://www.normattiva.it/atto/caricaDettaglioAtto?atto.dataPubblicazioneGazzetta=2026-01-07&atto.codiceRedazionale=25G00211
lavori-preparatori:
  - https://www.senato.it/leg/19/BGT/Schede/Ddliter/58123.htm
  - https://www.camera.it/leg19/126?leg=19&idDocumento=2393
camera:
  origine: Governo
  numero: "C. 2393"
  legislatura: 19
  firmatari:
    - nome: Giorgia Meloni
      ruolo: Presidente del Consiglio
    - Elisabetta Casellati
  argomenti: [semplificazione, deleghe]
  documenti:
    - https://documenti.camera.it/leg19/dossier/pdf/AC2393.pdf
  votazione-finale: https://www.camera.it/leg19/410?idSeduta=0500&tipo=votazioni
senato:
  numero: "S. 1192"
  legislatura: 19
  teseo:
    - SEMPLIFICAZIONE AMMINISTRATIVA
    - DELEGA LEGISLATIVA
aliases:
  - Legge semplificazioni 2026
"#;

    fn mapping(yaml: &str) -> Mapping {
        match serde_yaml::from_str(yaml).unwrap() {
            Value::Mapping(m) => m,
            other => panic!("not a mapping: {other:?}"),
        }
    }

    fn minimal() -> Mapping {
        mapping(
            "codice-redazionale: 26G00017\ntipo: LEGGE\nnumero-atto: 9\ndata-emanazione: 2026-01-20\n",
        )
    }

    #[test]
    fn full_record() {
        let rec = parse_mapping(&mapping(FULL)).unwrap();
        assert_eq!(rec.codice_redazionale, "26G00016");
        assert_eq!(rec.tipo, ActType::Legge);
        assert_eq!(rec.numero_atto, 5);
        assert_eq!(rec.data_emanazione, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!(rec.data_vigenza, NaiveDate::from_ymd_opt(2026, 1, 15));
        assert_eq!(rec.numero_gu, Some(10));
        assert_eq!(rec.atti_aggiornati.len(), 2);
        assert!(rec.atti_aggiornati[0].contains("25G00185"));
        assert!(rec.atti_correlati.is_empty());
        assert_eq!(rec.lavori_preparatori.len(), 2);
        assert!(rec.lavori_preparatori[0].contains("senato.it"));

        let camera = rec.camera.as_ref().unwrap();
        assert_eq!(camera.numero.as_deref(), Some("C. 2393"));
        assert_eq!(camera.legislatura, Some(19));
        assert_eq!(camera.firmatari.len(), 2);
        assert_eq!(camera.firmatari[0].ruolo.as_deref(), Some("Presidente del Consiglio"));
        assert_eq!(camera.firmatari[1].nome, "Elisabetta Casellati");
        assert!(camera.argomenti.contains("deleghe"));
        assert!(camera.votazione_finale.is_some());

        let senato = rec.senato.as_ref().unwrap();
        assert_eq!(senato.teseo.len(), 2);
        assert!(senato.firmatari.is_empty());
    }

    #[test]
    fn unknown_fields_preserved_verbatim() {
        let rec = parse_mapping(&mapping(FULL)).unwrap();
        assert_eq!(rec.extra.len(), 1);
        let aliases = rec.extra.get("aliases").unwrap();
        assert_eq!(aliases.as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn each_required_field_is_enforced() {
        for field in ["codice-redazionale", "tipo", "numero-atto", "data-emanazione"] {
            let mut m = minimal();
            m.remove(field);
            assert_eq!(
                parse_mapping(&m),
                Err(ValidationError::MissingField { field }),
                "removing {field}"
            );
        }
    }

    #[test]
    fn null_required_field_is_missing() {
        let m = mapping("codice-redazionale: 26G00017\ntipo:\nnumero-atto: 9\ndata-emanazione: 2026-01-20\n");
        assert_eq!(
            parse_mapping(&m),
            Err(ValidationError::MissingField { field: "tipo" })
        );
    }

    #[test]
    fn malformed_required_fields() {
        let cases = [
            ("numero-atto: nove", "numero-atto"),
            ("numero-atto: -3", "numero-atto"),
            ("data-emanazione: 20/01/2026", "data-emanazione"),
            ("codice-redazionale: 12345", "codice-redazionale"),
            ("tipo: [LEGGE]", "tipo"),
        ];
        for (line, field) in cases {
            let mut m = minimal();
            let override_map = mapping(line);
            for (k, v) in override_map {
                m.insert(k, v);
            }
            let err = parse_mapping(&m).unwrap_err();
            assert_eq!(err.field(), Some(field), "case {line}");
        }
    }

    #[test]
    fn malformed_optional_field_rejects_record() {
        let mut m = minimal();
        m.insert("data-gu".into(), "14 gennaio 2026".into());
        let err = parse_mapping(&m).unwrap_err();
        assert_eq!(err.field(), Some("data-gu"));
    }

    #[test]
    fn numero_atto_accepts_digit_string() {
        let mut m = minimal();
        m.insert("numero-atto".into(), "9".into());
        assert_eq!(parse_mapping(&m).unwrap().numero_atto, 9);
    }

    #[test]
    fn absent_and_empty_lists_are_empty() {
        let rec = parse_mapping(&minimal()).unwrap();
        assert!(rec.atti_aggiornati.is_empty());
        assert!(rec.lavori_preparatori.is_empty());

        let mut m = minimal();
        m.insert("atti-correlati".into(), Value::Null);
        m.insert("atti-aggiornati".into(), Value::Sequence(vec![]));
        let rec = parse_mapping(&m).unwrap();
        assert!(rec.atti_correlati.is_empty());
        assert!(rec.atti_aggiornati.is_empty());
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn lists_keep_order_and_drop_blanks() {
        let mut m = minimal();
        m.insert(
            "atti-correlati".into(),
            Value::Sequence(vec!["z".into(), "  ".into(), "a".into(), "m".into()]),
        );
        let rec = parse_mapping(&m).unwrap();
        assert_eq!(rec.atti_correlati, vec!["z", "a", "m"]);
    }

    #[test]
    fn scalar_list_is_single_item() {
        let mut m = minimal();
        m.insert("lavori-preparatori".into(), "https://www.senato.it/x".into());
        let rec = parse_mapping(&m).unwrap();
        assert_eq!(rec.lavori_preparatori, vec!["https://www.senato.it/x"]);
    }

    #[test]
    fn camel_case_keys_accepted() {
        let m = mapping(
            "codiceRedazionale: 26G00020\ntipo: DECRETO-LEGGE\nnumeroAtto: 3\ndataEmanazione: 2026-01-22\ndataGU: 2026-01-22\nattiAggiornati:\n  - x\n",
        );
        let rec = parse_mapping(&m).unwrap();
        assert_eq!(rec.codice_redazionale, "26G00020");
        assert_eq!(rec.tipo, ActType::DecretoLegge);
        assert!(rec.data_gu.is_some());
        assert_eq!(rec.atti_aggiornati, vec!["x"]);
    }

    #[test]
    fn conflicting_spellings_rejected() {
        let m = mapping(
            "codice-redazionale: 26G00020\ncodiceRedazionale: 26G00021\ntipo: LEGGE\nnumero-atto: 3\ndata-emanazione: 2026-01-22\n",
        );
        let err = parse_mapping(&m).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed { .. }));
    }

    #[test]
    fn provenance_unknown_fields_kept() {
        let mut m = minimal();
        m.insert(
            "camera".into(),
            mapping("numero: \"C. 1987\"\nrelatori: [Mario Rossi]\nfirmatari:\n  - nome: Anna Bianchi\n    gruppo: Misto\n").into(),
        );
        m.insert("senato".into(), mapping("numero: S. 1\nvotazione-finale: x").into());
        let rec = parse_mapping(&m).unwrap();

        let camera = rec.camera.unwrap();
        assert_eq!(camera.numero.as_deref(), Some("C. 1987"));
        let relatori = camera.extra.get("relatori").unwrap();
        assert_eq!(relatori.as_sequence().unwrap()[0].as_str(), Some("Mario Rossi"));
        assert_eq!(camera.firmatari[0].nome, "Anna Bianchi");
        assert_eq!(
            camera.firmatari[0].extra.get("gruppo").and_then(Value::as_str),
            Some("Misto")
        );

        let senato = rec.senato.unwrap();
        assert_eq!(senato.extra.get("votazione-finale").and_then(Value::as_str), Some("x"));
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn unquoted_numeric_looking_codice_kept_literally() {
        let yaml = "codice-redazionale: 26E00001\ntipo: DECRETO\nnumero-atto: 1\ndata-emanazione: 2026-01-02\n";
        let block = MetadataBlock::new(BlockOrigin::inline(0), yaml);
        let parsed = parse_block(&block).unwrap();
        assert_eq!(parsed.record.codice_redazionale, "26E00001");

        let yaml = "codiceRedazionale: 26E00002   # serie E\ntipo: DECRETO\nnumero-atto: 2\ndata-emanazione: 2026-01-02\n";
        let block = MetadataBlock::new(BlockOrigin::inline(0), yaml);
        assert_eq!(parse_block(&block).unwrap().record.codice_redazionale, "26E00002");
    }

    #[test]
    fn file_name_dates() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(
            file_name_date(Path::new("2026/01/9/LEGGE 20 gennaio 2026, n. 9.md")),
            date(2026, 1, 20)
        );
        assert_eq!(
            file_name_date(Path::new("DECRETO 1° Marzo 2026, n. 2.md")),
            date(2026, 3, 1)
        );
        assert_eq!(file_name_date(Path::new("LEGGE 31 febbraio 2026, n. 3.md")), None);
        assert_eq!(file_name_date(Path::new("2026/01/9/x.md")), None);
    }

    #[test]
    fn file_name_date_mismatch_is_a_warning() {
        let rec = parse_mapping(&minimal()).unwrap();
        let warnings =
            check_consistency(&rec, Some(Path::new("2026/01/9/LEGGE 21 gennaio 2026, n. 9.md")));
        assert_eq!(
            warnings,
            vec![ConsistencyWarning::FileNameDate {
                codice: "26G00017".into(),
                file_date: NaiveDate::from_ymd_opt(2026, 1, 21).unwrap(),
                data_emanazione: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            }]
        );
    }

    #[test]
    fn canonical_keys() {
        assert_eq!(canonical_key("codiceRedazionale"), "codice-redazionale");
        assert_eq!(canonical_key("codice_redazionale"), "codice-redazionale");
        assert_eq!(canonical_key("dataGU"), "data-gu");
        assert_eq!(canonical_key("guLink"), "gu-link");
        assert_eq!(canonical_key("TIPO"), "tipo");
        assert_eq!(canonical_key("data-emanazione"), "data-emanazione");
    }

    #[test]
    fn parse_block_rejects_non_mapping() {
        let block = MetadataBlock::new(BlockOrigin::inline(0), "- a\n- b\n");
        assert_eq!(parse_block(&block), Err(ValidationError::NotAMapping));
    }

    #[test]
    fn parse_block_reports_yaml_errors() {
        let block = MetadataBlock::new(BlockOrigin::inline(0), "tipo: [LEGGE\n");
        assert!(matches!(parse_block(&block), Err(ValidationError::Yaml { .. })));
    }

    #[test]
    fn folder_hint_layouts() {
        let h = FolderHint::from_path(Path::new("vault/2026/01/9/LEGGE 20 gennaio 2026, n. 9.md")).unwrap();
        assert_eq!((h.year, h.month, h.day, h.numero), (2026, 1, None, Some(9)));

        let h = FolderHint::from_path(Path::new("2026/01/20/9/x.md")).unwrap();
        assert_eq!((h.year, h.month, h.day, h.numero), (2026, 1, Some(20), Some(9)));

        let h = FolderHint::from_path(Path::new("2026/01/x.md")).unwrap();
        assert_eq!((h.day, h.numero), (None, None));

        assert!(FolderHint::from_path(Path::new("notes/x.md")).is_none());
        assert!(FolderHint::from_path(Path::new("x.md")).is_none());
    }

    #[test]
    fn folder_mismatch_is_a_warning() {
        let mut m = minimal();
        m.insert("data-gu".into(), "2026-01-19".into());
        let block = MetadataBlock {
            origin: BlockOrigin::file("2026/02/8/x.md", 0),
            yaml: serde_yaml::to_string(&m).unwrap(),
        };
        let parsed = parse_block(&block).unwrap();
        assert_eq!(parsed.record.codice_redazionale, "26G00017");
        assert_eq!(parsed.warnings.len(), 3);
        assert!(matches!(parsed.warnings[0], ConsistencyWarning::FolderDate { .. }));
        assert!(matches!(
            parsed.warnings[1],
            ConsistencyWarning::FolderNumber { folder: 8, numero_atto: 9, .. }
        ));
        assert_eq!(
            parsed.warnings[2],
            ConsistencyWarning::DateOrder {
                codice: "26G00017".into(),
                earlier: "data-emanazione",
                later: "data-gu",
            }
        );
    }

    #[test]
    fn matching_folder_has_no_warnings() {
        let rec = parse_mapping(&minimal()).unwrap();
        assert!(check_consistency(&rec, Some(Path::new("2026/01/9/x.md"))).is_empty());
        assert!(check_consistency(&rec, Some(Path::new("2026/01/20/9/x.md"))).is_empty());
        assert!(
            check_consistency(&rec, Some(Path::new("2026/01/9/LEGGE 20 gennaio 2026, n. 9.md")))
                .is_empty()
        );
        assert!(check_consistency(&rec, None).is_empty());
    }
}
