/// Arrow schema definitions for the legislative index.
pub mod vault {
    use std::sync::Arc;

    use arrow::array::{
        ArrayRef, Date32Array, ListArray, ListBuilder, StringArray, StringBuilder, UInt32Array,
    };
    use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;
    use chrono::{Datelike, NaiveDate};

    use crate::{LegislativeRecord, Sponsor};

    pub const LEGISLATION_TABLE: &str = "legislation";
    pub const LAW_EDGES_TABLE: &str = "law_edges";

    /// Days between 0001-01-01 (CE day 1) and 1970-01-01.
    const UNIX_EPOCH_FROM_CE: i32 = 719_163;

    fn utf8_list() -> DataType {
        DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
    }

    /// Reference-list columns, in record field order.
    pub const REFERENCE_LISTS: &[&str] = &[
        "atti_aggiornati",
        "atti_correlati",
        "lavori_preparatori",
        "aggiornamenti_atto",
        "note_atto",
        "relazioni",
        "aggiornamenti_titolo",
        "aggiornamenti_struttura",
        "atti_parlamentari",
        "atti_attuativi",
    ];

    /// One row per record. Empty lists and absent optionals are null.
    pub fn legislation_schema() -> Schema {
        let mut fields = vec![
            Field::new("codice_redazionale", DataType::Utf8, false),
            Field::new("tipo", DataType::Utf8, false),
            Field::new("tipo_short", DataType::Utf8, false),
            Field::new("numero_atto", DataType::UInt32, false),
            Field::new("citation", DataType::Utf8, false),
            Field::new("data_emanazione", DataType::Date32, false),
            Field::new("data_gu", DataType::Date32, true),
            Field::new("data_vigenza", DataType::Date32, true),
            Field::new("numero_gu", DataType::UInt32, true),
            Field::new("normattiva_urn", DataType::Utf8, true),
            Field::new("normattiva_link", DataType::Utf8, true),
            Field::new("gu_link", DataType::Utf8, true),
            Field::new("titolo_atto", DataType::Utf8, true),
            Field::new("descrizione_atto", DataType::Utf8, true),
            Field::new("titolo_alternativo", DataType::Utf8, true),
        ];
        fields.extend(
            REFERENCE_LISTS
                .iter()
                .map(|name| Field::new(*name, utf8_list(), true)),
        );
        fields.extend([
            Field::new("camera_origine", DataType::Utf8, true),
            Field::new("camera_numero", DataType::Utf8, true),
            Field::new("camera_legislatura", DataType::UInt32, true),
            Field::new("camera_firmatari", utf8_list(), true),
            Field::new("camera_argomenti", utf8_list(), true),
            Field::new("camera_documenti", utf8_list(), true),
            Field::new("camera_votazione_finale", DataType::Utf8, true),
            Field::new("senato_origine", DataType::Utf8, true),
            Field::new("senato_numero", DataType::Utf8, true),
            Field::new("senato_legislatura", DataType::UInt32, true),
            Field::new("senato_firmatari", utf8_list(), true),
            Field::new("senato_argomenti", utf8_list(), true),
            Field::new("senato_documenti", utf8_list(), true),
            Field::new("senato_teseo", utf8_list(), true),
            Field::new("extra", DataType::Utf8, true),
        ]);
        Schema::new(fields)
    }

    /// One row per resolved cross-reference.
    pub fn law_edges_schema() -> Schema {
        Schema::new(vec![
            Field::new("source", DataType::Utf8, false),
            Field::new("target", DataType::Utf8, false),
            Field::new("relation", DataType::Utf8, false),
        ])
    }

    pub fn date32(date: NaiveDate) -> i32 {
        date.num_days_from_ce() - UNIX_EPOCH_FROM_CE
    }

    fn list_column<'a, I>(rows: impl Iterator<Item = I>) -> ListArray
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut builder = ListBuilder::new(StringBuilder::new());
        for row in rows {
            let mut any = false;
            for item in row {
                builder.values().append_value(item);
                any = true;
            }
            builder.append(any);
        }
        builder.finish()
    }

    fn sponsor_labels(sponsors: &[Sponsor]) -> Vec<String> {
        sponsors.iter().map(Sponsor::to_string).collect()
    }

    /// Unknown keys as one JSON object: top-level keys as written, plus the
    /// unknown keys of the `camera` / `senato` blocks nested under those names.
    fn extra_json(r: &LegislativeRecord) -> Result<Option<String>, serde_json::Error> {
        let mut bag = serde_json::Map::new();
        for (key, value) in &r.extra {
            bag.insert(key.clone(), serde_json::to_value(value)?);
        }
        if let Some(camera) = r.camera.as_ref().filter(|c| !c.extra.is_empty()) {
            bag.insert("camera".into(), serde_json::to_value(&camera.extra)?);
        }
        if let Some(senato) = r.senato.as_ref().filter(|s| !s.extra.is_empty()) {
            bag.insert("senato".into(), serde_json::to_value(&senato.extra)?);
        }
        if bag.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(&bag).map(Some)
    }

    /// Flatten records into a batch matching [`legislation_schema`].
    pub fn records_to_batch<'a>(
        records: impl IntoIterator<Item = &'a LegislativeRecord>,
    ) -> Result<RecordBatch, ArrowError> {
        let recs: Vec<&LegislativeRecord> = records.into_iter().collect();
        let schema: SchemaRef = Arc::new(legislation_schema());

        let text = |f: fn(&LegislativeRecord) -> Option<&str>| -> ArrayRef {
            Arc::new(recs.iter().map(|r| f(r)).collect::<StringArray>())
        };
        let date = |f: fn(&LegislativeRecord) -> Option<NaiveDate>| -> ArrayRef {
            Arc::new(
                recs.iter()
                    .map(|r| f(r).map(date32))
                    .collect::<Date32Array>(),
            )
        };
        let number = |f: fn(&LegislativeRecord) -> Option<u32>| -> ArrayRef {
            Arc::new(recs.iter().map(|r| f(r)).collect::<UInt32Array>())
        };

        let mut columns: Vec<ArrayRef> = vec![
            text(|r| Some(r.codice_redazionale.as_str())),
            text(|r| Some(r.tipo.label())),
            text(|r| Some(r.tipo.short_label())),
            number(|r| Some(r.numero_atto)),
            Arc::new(
                recs.iter()
                    .map(|r| Some(r.citation()))
                    .collect::<StringArray>(),
            ),
            date(|r| Some(r.data_emanazione)),
            date(|r| r.data_gu),
            date(|r| r.data_vigenza),
            number(|r| r.numero_gu),
            text(|r| r.normattiva_urn.as_deref()),
            text(|r| r.normattiva_link.as_deref()),
            text(|r| r.gu_link.as_deref()),
            text(|r| r.titolo_atto.as_deref()),
            text(|r| r.descrizione_atto.as_deref()),
            text(|r| r.titolo_alternativo.as_deref()),
        ];

        let lists: [fn(&LegislativeRecord) -> &[String]; 10] = [
            |r| r.atti_aggiornati.as_slice(),
            |r| r.atti_correlati.as_slice(),
            |r| r.lavori_preparatori.as_slice(),
            |r| r.aggiornamenti_atto.as_slice(),
            |r| r.note_atto.as_slice(),
            |r| r.relazioni.as_slice(),
            |r| r.aggiornamenti_titolo.as_slice(),
            |r| r.aggiornamenti_struttura.as_slice(),
            |r| r.atti_parlamentari.as_slice(),
            |r| r.atti_attuativi.as_slice(),
        ];
        for list in lists {
            columns.push(Arc::new(list_column(
                recs.iter().map(|r| list(r).iter().map(String::as_str)),
            )));
        }

        let camera_firmatari: Vec<Vec<String>> = recs
            .iter()
            .map(|r| r.camera.as_ref().map(|c| sponsor_labels(&c.firmatari)).unwrap_or_default())
            .collect();
        let senato_firmatari: Vec<Vec<String>> = recs
            .iter()
            .map(|r| r.senato.as_ref().map(|s| sponsor_labels(&s.firmatari)).unwrap_or_default())
            .collect();

        let provenance: Vec<ArrayRef> = vec![
            text(|r| r.camera.as_ref().and_then(|c| c.origine.as_deref())),
            text(|r| r.camera.as_ref().and_then(|c| c.numero.as_deref())),
            number(|r| r.camera.as_ref().and_then(|c| c.legislatura)),
            Arc::new(list_column(
                camera_firmatari.iter().map(|v| v.iter().map(String::as_str)),
            )),
            Arc::new(list_column(recs.iter().map(|r| {
                r.camera
                    .iter()
                    .flat_map(|c| c.argomenti.iter().map(String::as_str))
            }))),
            Arc::new(list_column(recs.iter().map(|r| {
                r.camera
                    .iter()
                    .flat_map(|c| c.documenti.iter().map(String::as_str))
            }))),
            text(|r| r.camera.as_ref().and_then(|c| c.votazione_finale.as_deref())),
            text(|r| r.senato.as_ref().and_then(|s| s.origine.as_deref())),
            text(|r| r.senato.as_ref().and_then(|s| s.numero.as_deref())),
            number(|r| r.senato.as_ref().and_then(|s| s.legislatura)),
            Arc::new(list_column(
                senato_firmatari.iter().map(|v| v.iter().map(String::as_str)),
            )),
            Arc::new(list_column(recs.iter().map(|r| {
                r.senato
                    .iter()
                    .flat_map(|s| s.argomenti.iter().map(String::as_str))
            }))),
            Arc::new(list_column(recs.iter().map(|r| {
                r.senato
                    .iter()
                    .flat_map(|s| s.documenti.iter().map(String::as_str))
            }))),
            Arc::new(list_column(recs.iter().map(|r| {
                r.senato
                    .iter()
                    .flat_map(|s| s.teseo.iter().map(String::as_str))
            }))),
        ];
        columns.extend(provenance);

        let extra = recs
            .iter()
            .map(|r| extra_json(r))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ArrowError::ExternalError(Box::new(e)))?;
        columns.push(Arc::new(StringArray::from(extra)));

        RecordBatch::try_new(schema, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::vault;
    use crate::{ActType, CameraProvenance, LegislativeRecord, Sponsor};
    use arrow::array::{Array, Date32Array, ListArray, StringArray, UInt32Array};
    use chrono::NaiveDate;

    fn record(codice: &str, numero: u32, day: u32) -> LegislativeRecord {
        LegislativeRecord::new(
            codice,
            ActType::Legge,
            numero,
            NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
        )
    }

    #[test]
    fn legislation_schema_has_expected_fields() {
        let schema = vault::legislation_schema();
        assert_eq!(schema.fields().len(), 15 + vault::REFERENCE_LISTS.len() + 15);
        assert!(schema.field_with_name("codice_redazionale").is_ok());
        assert!(schema.field_with_name("atti_attuativi").is_ok());
        assert!(schema.field_with_name("senato_teseo").is_ok());
        assert!(!schema.field_with_name("numero_atto").unwrap().is_nullable());
    }

    #[test]
    fn law_edges_schema_has_expected_fields() {
        let schema = vault::law_edges_schema();
        assert_eq!(schema.fields().len(), 3);
        assert!(schema.field_with_name("relation").is_ok());
    }

    #[test]
    fn date32_counts_from_unix_epoch() {
        assert_eq!(vault::date32(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(vault::date32(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(vault::date32(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), -1);
    }

    #[test]
    fn records_flatten_into_batch() {
        let mut a = record("26G00017", 9, 20);
        a.atti_correlati = vec!["x".into(), "y".into()];
        a.camera = Some(CameraProvenance {
            firmatari: vec![Sponsor {
                nome: "Mario Rossi".into(),
                ruolo: Some("relatore".into()),
                ..Default::default()
            }],
            ..Default::default()
        });
        a.extra.insert("aliases".into(), "Legge nove".into());
        let b = record("25G00211", 1, 5);

        let batch = vault::records_to_batch([&a, &b]).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let citation = batch
            .column_by_name("citation")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(citation.value(0), "Legge n. 9/26");

        let numero = batch
            .column_by_name("numero_atto")
            .unwrap()
            .as_any()
            .downcast_ref::<UInt32Array>()
            .unwrap();
        assert_eq!(numero.value(1), 1);

        let dates = batch
            .column_by_name("data_gu")
            .unwrap()
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert!(dates.is_null(0));

        let correlati = batch
            .column_by_name("atti_correlati")
            .unwrap()
            .as_any()
            .downcast_ref::<ListArray>()
            .unwrap();
        assert_eq!(correlati.value(0).len(), 2);
        assert!(correlati.is_null(1));

        let firmatari = batch
            .column_by_name("camera_firmatari")
            .unwrap()
            .as_any()
            .downcast_ref::<ListArray>()
            .unwrap();
        let names = firmatari.value(0);
        let names = names.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(0), "Mario Rossi (relatore)");

        let extra = batch
            .column_by_name("extra")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(extra.value(0), r#"{"aliases":"Legge nove"}"#);
        assert!(extra.is_null(1));
    }

    #[test]
    fn provenance_extras_nest_in_extra_column() {
        let mut a = record("26G00017", 9, 20);
        let mut camera = CameraProvenance::default();
        camera
            .extra
            .insert("relatori".into(), vec![serde_yaml::Value::from("Mario Rossi")].into());
        a.camera = Some(camera);

        let batch = vault::records_to_batch([&a]).unwrap();
        let extra = batch
            .column_by_name("extra")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(extra.value(0), r#"{"camera":{"relatori":["Mario Rossi"]}}"#);
    }

    #[test]
    fn empty_input_gives_empty_batch() {
        let batch = vault::records_to_batch(std::iter::empty()).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.schema().fields().len(), vault::legislation_schema().fields().len());
    }
}
