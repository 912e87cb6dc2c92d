// SPDX-License-Identifier: MIT OR Apache-2.0
//! Case markers moving along the process model.
//!
//! Marker paths are expressed in slot units, which makes them invariant
//! under rate changes: the clock remaps engine time and slot span together,
//! so a marker's slot position never jumps when the speed changes.

use serde::{Deserialize, Serialize};

use crate::payload::TokenAnimationPayload;

/// One traversed model element in a marker path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSegment {
    /// Model element the marker moves along
    pub element_id: String,
    /// Slot position at which traversal begins
    pub begin_slot: f64,
    /// Traversal length in slots
    pub dur_slots: f64,
}

impl PathSegment {
    fn end_slot(&self) -> f64 {
        self.begin_slot + self.dur_slots
    }
}

/// Where a marker currently sits on the model.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPosition {
    /// Model element the marker is on
    pub element_id: String,
    /// Fraction of the element traversed, in `[0, 1]`
    pub fraction: f64,
}

/// The moving marker of one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseMarker {
    /// Case identifier from the event log
    pub case_id: String,
    segments: Vec<PathSegment>,
}

impl CaseMarker {
    /// Build a marker from its payload form, ordering segments by start.
    pub fn from_payload(payload: &TokenAnimationPayload) -> Self {
        let mut segments: Vec<PathSegment> = payload
            .path
            .iter()
            .map(|segment| PathSegment {
                element_id: segment.element_id.clone(),
                begin_slot: segment.begin_slot,
                dur_slots: segment.dur_slots,
            })
            .collect();
        segments.sort_by(|a, b| a.begin_slot.total_cmp(&b.begin_slot));

        Self {
            case_id: payload.case_id.clone(),
            segments,
        }
    }

    /// Slot at which the case appears on the model.
    pub fn start_slot(&self) -> Option<f64> {
        self.segments.first().map(|s| s.begin_slot)
    }

    /// Slot at which the case leaves the model.
    pub fn end_slot(&self) -> Option<f64> {
        self.segments
            .iter()
            .map(PathSegment::end_slot)
            .fold(None, |acc, end| Some(acc.map_or(end, |a: f64| a.max(end))))
    }

    /// Position of the marker at a slot time.
    ///
    /// `None` before the case appears and after it completes. Between two
    /// segments the marker holds at the end of the one last finished.
    pub fn position_at(&self, slot_time: f64) -> Option<MarkerPosition> {
        let first = self.segments.first()?;
        if slot_time < first.begin_slot {
            return None;
        }
        if slot_time > self.end_slot()? {
            return None;
        }

        let mut held: Option<&PathSegment> = None;
        for segment in &self.segments {
            if slot_time < segment.begin_slot {
                break;
            }
            if slot_time <= segment.end_slot() {
                let fraction = if segment.dur_slots > 0.0 {
                    (slot_time - segment.begin_slot) / segment.dur_slots
                } else {
                    1.0
                };
                return Some(MarkerPosition {
                    element_id: segment.element_id.clone(),
                    fraction,
                });
            }
            held = Some(segment);
        }

        held.map(|segment| MarkerPosition {
            element_id: segment.element_id.clone(),
            fraction: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PathSegmentPayload;

    fn marker() -> CaseMarker {
        CaseMarker::from_payload(&TokenAnimationPayload {
            case_id: "case-1".to_string(),
            path: vec![
                PathSegmentPayload {
                    element_id: "edge-a".to_string(),
                    begin_slot: 10.0,
                    dur_slots: 5.0,
                },
                PathSegmentPayload {
                    element_id: "edge-b".to_string(),
                    begin_slot: 20.0,
                    dur_slots: 10.0,
                },
            ],
        })
    }

    #[test]
    fn test_not_spawned_before_first_segment() {
        assert_eq!(marker().position_at(5.0), None);
    }

    #[test]
    fn test_mid_segment_fraction() {
        let position = marker().position_at(12.5).unwrap();
        assert_eq!(position.element_id, "edge-a");
        assert_eq!(position.fraction, 0.5);
    }

    #[test]
    fn test_holds_between_segments() {
        let position = marker().position_at(17.0).unwrap();
        assert_eq!(position.element_id, "edge-a");
        assert_eq!(position.fraction, 1.0);
    }

    #[test]
    fn test_completed_after_last_segment() {
        let position = marker().position_at(30.0).unwrap();
        assert_eq!(position.fraction, 1.0);
        assert_eq!(marker().position_at(30.1), None);
    }

    #[test]
    fn test_segments_sorted_on_load() {
        let unsorted = CaseMarker::from_payload(&TokenAnimationPayload {
            case_id: "case-2".to_string(),
            path: vec![
                PathSegmentPayload {
                    element_id: "late".to_string(),
                    begin_slot: 50.0,
                    dur_slots: 1.0,
                },
                PathSegmentPayload {
                    element_id: "early".to_string(),
                    begin_slot: 1.0,
                    dur_slots: 1.0,
                },
            ],
        });
        assert_eq!(unsorted.start_slot(), Some(1.0));
        assert_eq!(unsorted.position_at(1.5).unwrap().element_id, "early");
    }
}
