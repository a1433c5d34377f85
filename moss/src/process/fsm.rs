//! State machine validating and decoding the body of a unit frame.
//!
//! The body is everything strictly between a unit frame header and its
//! trailer. Region headers must appear once each in ascending order, hits are
//! complete DATA_0, DATA_1, DATA_2 triples inside a region, and idle words may
//! pad anywhere between hits.

use crate::structs::format::FrameFormat;
use crate::structs::hit::MossHit;
use crate::structs::word::MossWord;
use crate::utils::errors::FrameErrorReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Header seen, no region header yet.
    AwaitRegion,
    /// Inside a region, between hits.
    Region(u8),
    /// DATA_0 seen, DATA_1 pending.
    Data0(u8),
    /// DATA_1 seen, DATA_2 pending.
    Data1(u8),
}

impl State {
    fn expected(&self) -> &'static str {
        match self {
            State::AwaitRegion => "REGION_HEADER_0",
            State::Region(_) => "REGION_HEADER/DATA_0/IDLE/UNIT_FRAME_TRAILER",
            State::Data0(_) => "DATA_1",
            State::Data1(_) => "DATA_2",
        }
    }
}

#[derive(Debug)]
pub(crate) struct FrameBody {
    state: State,
    next_region: u8,
    regions: u8,
    hit: MossHit,
    hits: Vec<MossHit>,
}

impl FrameBody {
    pub(crate) fn new(format: &FrameFormat) -> Self {
        Self {
            state: State::AwaitRegion,
            next_region: 0,
            regions: format.regions(),
            hit: MossHit::default(),
            hits: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn feed(&mut self, word: MossWord) -> Result<(), FrameErrorReason> {
        self.state = match (self.state, word) {
            (State::AwaitRegion | State::Region(_), MossWord::Idle) => self.state,
            (State::AwaitRegion | State::Region(_), MossWord::RegionHeader(region)) => {
                if self.next_region >= self.regions {
                    return Err(self.unexpected(word));
                }
                if region != self.next_region {
                    return Err(FrameErrorReason::RegionOutOfOrder {
                        expected: self.next_region,
                        found: region,
                    });
                }
                self.next_region += 1;
                State::Region(region)
            }
            (State::AwaitRegion, MossWord::Data0(_)) => {
                return Err(FrameErrorReason::DataOutsideRegion);
            }
            (State::Region(region), MossWord::Data0(row_hi)) => {
                self.hit = MossHit {
                    region,
                    row: (row_hi as u16) << 3, // row [8:3]
                    column: 0,
                };
                State::Data0(region)
            }
            (State::Data0(region), MossWord::Data1(mid)) => {
                self.hit.row |= ((mid >> 3) & 0x07) as u16; // row [2:0]
                self.hit.column = ((mid & 0x07) as u16) << 6; // column [8:6]
                State::Data1(region)
            }
            (State::Data1(region), MossWord::Data2(col_lo)) => {
                self.hit.column |= col_lo as u16; // column [5:0]
                self.hits.push(self.hit);
                State::Region(region)
            }
            (_, MossWord::UnitFrameHeader(unit_id)) => {
                return Err(FrameErrorReason::NestedHeader { unit_id });
            }
            (_, MossWord::Invalid(byte)) => return Err(FrameErrorReason::InvalidWord(byte)),
            _ => return Err(self.unexpected(word)),
        };

        Ok(())
    }

    /// Closes the frame at its trailer and returns the decoded hits.
    pub(crate) fn finish(self) -> Result<Vec<MossHit>, FrameErrorReason> {
        match self.state {
            State::Data0(_) | State::Data1(_) => Err(FrameErrorReason::IncompleteHit),
            _ if self.next_region < self.regions => Err(FrameErrorReason::MissingRegions {
                seen: self.next_region,
                expected: self.regions,
            }),
            _ => Ok(self.hits),
        }
    }

    fn unexpected(&self, found: MossWord) -> FrameErrorReason {
        FrameErrorReason::UnexpectedWord {
            expected: self.state.expected(),
            found,
        }
    }
}
