use crate::data::model::ResultTable;
use crate::error::PipelineError;

/// Serialise the labelled table as UTF-8 CSV: the uploaded columns as
/// uploaded (missing cells empty) followed by `Predicted_Group` as 0/1/2.
pub fn predictions_csv(table: &ResultTable) -> Result<Vec<u8>, PipelineError> {
    let render = |e: csv::Error| PipelineError::Render(format!("writing CSV: {e}"));
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(table.columns()).map_err(render)?;
    for (row, label) in table.raw.rows.iter().zip(&table.predictions) {
        let code = label.code().to_string();
        let fields = row
            .iter()
            .map(|cell| cell.export_text())
            .chain(std::iter::once(code.as_str()));
        writer.write_record(fields).map_err(render)?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::Render(format!("flushing CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::data::model::Diagnosis;

    #[test]
    fn test_export_appends_prediction_column() {
        let raw = read_csv(
            "ID,Feature1,Feature2,Feature3\n\
             s1,0.5,2.1,1.1\n\
             s2,1.2,--,3.0\n\
             s3,3.3,4.5,2.8\n"
                .as_bytes(),
        )
        .unwrap();
        let table =
            ResultTable::new(raw, vec![Diagnosis::Cn, Diagnosis::Mci, Diagnosis::Ad]).unwrap();
        let csv = String::from_utf8(predictions_csv(&table).unwrap()).unwrap();

        assert_eq!(
            csv,
            "ID,Feature1,Feature2,Feature3,Predicted_Group\n\
             s1,0.5,2.1,1.1,0\n\
             s2,1.2,,3.0,1\n\
             s3,3.3,4.5,2.8,2\n"
        );
    }

    #[test]
    fn test_export_reparses_with_same_shape() {
        let raw = read_csv("ID,A\nx,1\ny,2\n".as_bytes()).unwrap();
        let table = ResultTable::new(raw, vec![Diagnosis::Ad, Diagnosis::Cn]).unwrap();
        let bytes = predictions_csv(&table).unwrap();
        let back = read_csv(bytes.as_slice()).unwrap();
        assert_eq!(back.columns.len(), 3);
        assert_eq!(back.len(), 2);
    }
}
