use std::{fs::File, io::Write, path::Path};

use crate::{Error, Result, record::CourseRecord};

/// Writes the records to `path`, replacing any existing file. The header row is always written.
pub fn write_csv(path: &Path, records: &[CourseRecord]) -> Result<()> {
	let file = File::create(path)
		.map_err(|source| Error::CreateOutput { path: path.to_path_buf(), source })?;

	write_records(file, records)
}

pub fn write_records<W>(out: W, records: &[CourseRecord]) -> Result<()>
where
	W: Write,
{
	let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);

	writer.write_record(CourseRecord::HEADERS)?;

	for record in records {
		writer.serialize(record)?;
	}

	writer.flush()?;

	Ok(())
}
