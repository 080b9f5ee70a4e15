use std::io::{self, Write};

use color_eyre::{Report, Result};

use mentorboard::{
    records::{SortOrder, StudentRecord, aggregate_score, certificate_label, sort_by_batch},
    store::RecordSource,
    viewer::{FetchOutcome, NO_DATA_MESSAGE, fetch_students},
};

pub struct Options {
    pub json: bool,
}

pub async fn command(source: &dyn RecordSource, path: &str, options: Options) -> Result<()> {
    let records = match fetch_students(source, path).await {
        FetchOutcome::Records { records, .. } => records,
        FetchOutcome::NoData => {
            eprintln!("{NO_DATA_MESSAGE}");
            return Ok(());
        }
        FetchOutcome::Failed(err) => {
            return Err(Report::new(err).wrap_err(format!("Could not load students from /{path}")));
        }
    };

    let mut rows: Vec<&StudentRecord> = records.iter().collect();
    sort_by_batch(&mut rows, SortOrder::Ascending);

    let mut out = io::stdout().lock();
    if options.json {
        writeln!(out, "{}", serde_json::to_string(&rows)?)?;
        return Ok(());
    }

    for record in rows {
        writeln!(out, "{}", summary_line(record))?;
    }
    Ok(())
}

fn summary_line(record: &StudentRecord) -> String {
    let certificates = &record.certificates;
    format!(
        "{}\t{}\t{}\t{}/{}/{}\t{}",
        record.batch,
        record.name,
        record.stack,
        certificate_label(certificates.english()),
        certificate_label(certificates.scrum()),
        certificate_label(certificates.cyber_security()),
        aggregate_score(&record.grades),
    )
}
