use crate::source::record::ChatRecord;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::{HashSet, VecDeque};

/// How far below the cursor a record's timestamp may fall and still be
/// judged by the recency set instead of dropped outright. Log timestamps
/// carry minute precision, so distinct records can share a timestamp; two
/// minutes covers the tie plus one tick of writer clock skew.
const SEEN_WINDOW_SECS: i64 = 120;

/// Upper bound on retained dedup keys.
const SEEN_CAPACITY: usize = 4096;

/// Progress cursor over the record stream.
///
/// Holds the highest delivered timestamp plus a bounded recency set of
/// composite keys (timestamp + author + message). A record is accepted when
/// its timestamp is strictly beyond the cursor, or when it sits within the
/// recency window and its key is unseen. Everything else is a replay.
///
/// Process-lifetime only; resets to empty on restart.
pub struct Watermark {
    last: Option<DateTime<Utc>>,
    seen: HashSet<u64>,
    order: VecDeque<(DateTime<Utc>, u64)>,
}

impl Watermark {
    pub fn new() -> Self {
        Self {
            last: None,
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    /// A watermark fabricated at a known cursor position. Everything at or
    /// before `timestamp` counts as already delivered.
    pub fn starting_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            last: Some(timestamp),
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    /// Highest accepted timestamp so far, absent before the first accept.
    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    /// Filter `records` down to the not-yet-delivered subset.
    ///
    /// Records must arrive in chronological input order; the cursor advances
    /// within the call, so an early high timestamp would otherwise suppress
    /// later legitimately-new records. Output is an order-preserving
    /// subsequence of the input.
    pub fn accept(&mut self, records: Vec<ChatRecord>) -> Vec<ChatRecord> {
        let mut fresh = Vec::new();

        for record in records {
            let key = composite_key(&record);

            let is_new = match self.last {
                None => true,
                Some(last) => {
                    record.timestamp > last
                        || (last - record.timestamp <= Duration::seconds(SEEN_WINDOW_SECS)
                            && !self.seen.contains(&key))
                }
            };

            if !is_new {
                continue;
            }

            self.remember(record.timestamp, key);
            if self.last.map_or(true, |last| record.timestamp > last) {
                self.last = Some(record.timestamp);
            }
            self.evict();

            fresh.push(record);
        }

        fresh
    }

    fn remember(&mut self, timestamp: DateTime<Utc>, key: u64) {
        if self.seen.insert(key) {
            self.order.push_back((timestamp, key));
        }
    }

    fn evict(&mut self) {
        if let Some(last) = self.last {
            let horizon = last - Duration::seconds(SEEN_WINDOW_SECS);
            while let Some(&(timestamp, key)) = self.order.front() {
                if timestamp >= horizon {
                    break;
                }
                self.order.pop_front();
                self.seen.remove(&key);
            }
        }

        while self.order.len() > SEEN_CAPACITY {
            if let Some((_, key)) = self.order.pop_front() {
                self.seen.remove(&key);
            }
        }
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::new()
    }
}

fn composite_key(record: &ChatRecord) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(record.timestamp.timestamp().to_be_bytes());
    hasher.update(record.author.as_bytes());
    hasher.update([0u8]);
    hasher.update(record.message.as_bytes());
    let digest = hasher.finalize();
    u64::from_be_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}
