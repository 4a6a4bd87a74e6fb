//! Variant catalogue loading (spec §3 "Variant catalogue"), a tab
//! separated format: one locus per line, `position<TAB>allele:freq,...`.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::error::GencallError;
use crate::variant_catalogue::{Locus, VariantCatalogue};

/// Loads a catalogue file into a [`VariantCatalogue`]. Each line is
/// `position\tALLELE1:freq1,ALLELE2:freq2,...`, 0-indexed against the
/// reference.
pub fn read_catalogue(path: impl AsRef<Path>) -> Result<VariantCatalogue, GencallError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| GencallError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = io::BufReader::new(file);

    let mut loci = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| GencallError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        loci.push(parse_locus_line(path, line_number + 1, line)?);
    }

    Ok(VariantCatalogue::new(loci))
}

fn parse_locus_line(path: &Path, line: usize, text: &str) -> Result<Locus, GencallError> {
    let malformed = |reason: &str| GencallError::MalformedCatalogue {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    };

    let mut fields = text.split('\t');
    let position: usize = fields
        .next()
        .ok_or_else(|| malformed("missing position field"))?
        .parse()
        .map_err(|_| malformed("position is not an integer"))?;
    let allele_field = fields.next().ok_or_else(|| malformed("missing allele field"))?;

    let mut alleles = Vec::new();
    let mut frequencies = Vec::new();
    for entry in allele_field.split(',') {
        let (allele, freq) = entry
            .split_once(':')
            .ok_or_else(|| malformed("allele entry missing ':freq'"))?;
        if allele.is_empty() {
            return Err(malformed("empty allele string"));
        }
        let freq: f64 = freq.parse().map_err(|_| malformed("frequency is not a number"))?;
        alleles.push(allele.as_bytes().to_ascii_uppercase());
        frequencies.push(freq);
    }

    if alleles.is_empty() {
        return Err(malformed("locus has no alleles"));
    }

    Ok(Locus::new(position, alleles, frequencies))
}
