//! Result output (spec §4.6 "Output format"): one line per
//! posterior that disagrees with the reference, `position\tallele\tphred`.

use std::io::{self, Write};

use crate::posterior::PosteriorStore;
use crate::reference::Reference;

/// `Q = -10 * log10(1 - p)`, saturating at `1000` once `p` is within
/// `1e-100` of 1 (spec §4.6 "Phred-scaled confidence").
pub fn phred_quality(probability: f64) -> u32 {
    let complement = (1.0 - probability).max(1e-100);
    let q = -10.0 * complement.log10();
    q.min(1000.0).round() as u32
}

/// Writes one line per position whose posterior argmax differs from the
/// reference base, sorted by position for deterministic output. Loci
/// where the argmax agrees with the reference produce no line: spec
/// §8's "no variant" scenarios expect empty output for reads that never
/// disagree with the reference.
pub fn write_calls<W: Write>(
    mut writer: W,
    store: &PosteriorStore,
    reference: &Reference,
) -> io::Result<()> {
    let mut positions: Vec<&usize> = store.positions().collect();
    positions.sort_unstable();

    for &position in positions {
        let Some(posterior) = store.get(position) else {
            continue;
        };
        let Some((allele, probability)) = posterior.argmax() else {
            continue;
        };
        let reference_base = reference.base_at(position);
        let is_reference_call = reference_base.is_some_and(|b| allele == [b]);
        if is_reference_call {
            continue;
        }
        writeln!(
            writer,
            "{}\t{}\t{}",
            position,
            String::from_utf8_lossy(allele),
            phred_quality(probability)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AlleleEvent;
    use crate::variant_catalogue::VariantCatalogue;

    #[test]
    fn phred_saturates_at_1000() {
        assert_eq!(phred_quality(1.0), 1000);
        assert_eq!(phred_quality(0.0), 0);
    }

    #[test]
    fn reference_matching_calls_produce_no_line() {
        let reference = Reference::new(b"ACGT".to_vec());
        let catalogue = VariantCatalogue::new(vec![]);
        let mut store = PosteriorStore::new();
        store.apply_event(&AlleleEvent::new(0, b"A".to_vec(), vec![b'I']), &catalogue, || b'A');

        let mut out = Vec::new();
        write_calls(&mut out, &store, &reference).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn disagreeing_calls_are_emitted_sorted_by_position() {
        let reference = Reference::new(b"ACGT".to_vec());
        let catalogue = VariantCatalogue::new(vec![]);
        let mut store = PosteriorStore::new();
        for _ in 0..10 {
            store.apply_event(&AlleleEvent::new(2, b"T".to_vec(), vec![b'I']), &catalogue, || b'G');
        }
        for _ in 0..10 {
            store.apply_event(&AlleleEvent::new(0, b"G".to_vec(), vec![b'I']), &catalogue, || b'A');
        }

        let mut out = Vec::new();
        write_calls(&mut out, &store, &reference).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0\tG\t"));
        assert!(lines[1].starts_with("2\tT\t"));
    }
}
