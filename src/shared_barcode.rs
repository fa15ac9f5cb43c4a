//! Auxiliary shared-barcode map (§6's auxiliary operation): a read-only
//! contig -> (contig -> shared-barcode count) derivative, built from a
//! barcode -> [segment] inverted index, for callers that resolve barcodes
//! at segment-level granularity rather than through the default C3/C4/C5/C6
//! pipeline.

use std::collections::HashMap;

pub type SegmentId = i64;

/// segment_id -> barcodes observed on that segment.
pub type SegmentToBarcode = HashMap<SegmentId, Vec<String>>;

/// contig -> (contig -> shared-barcode count).
pub type SharedBarcodeMap = HashMap<SegmentId, HashMap<SegmentId, u32>>;

fn invert(segment_to_barcode: &SegmentToBarcode) -> HashMap<&str, Vec<SegmentId>> {
    let mut barcode_to_segment: HashMap<&str, Vec<SegmentId>> = HashMap::new();
    for (&segment, barcodes) in segment_to_barcode {
        for barcode in barcodes {
            barcode_to_segment.entry(barcode.as_str()).or_default().push(segment);
        }
    }
    barcode_to_segment
}

/// Build the shared-barcode map, then erase entries below
/// `min_shared_barcodes` in place and compact the inner containers —
/// mirroring the source's iterate-and-erase-then-compact discipline.
pub fn build_shared_barcode_map(
    segment_to_barcode: &SegmentToBarcode,
    min_shared_barcodes: u32,
) -> SharedBarcodeMap {
    let barcode_to_segment = invert(segment_to_barcode);

    let mut shared: SharedBarcodeMap = SharedBarcodeMap::new();
    for segments in barcode_to_segment.values() {
        for &seg_a in segments {
            for &seg_b in segments {
                if seg_a == seg_b {
                    continue;
                }
                *shared.entry(seg_a).or_default().entry(seg_b).or_insert(0) += 1;
            }
        }
    }

    for inner in shared.values_mut() {
        inner.retain(|_, &mut count| count >= min_shared_barcodes);
        inner.shrink_to_fit();
    }

    shared
}
