//! Read-only access to header history.
//!
//! The retarget engine never owns headers. It is handed a [`HeaderView`] for
//! the tip and walks backwards through `previous`. Implementations are cheap
//! copyable handles into a snapshot the caller keeps alive (and unchanged) for
//! the length of the call.

use serde::{Deserialize, Serialize};

use crate::compact::CompactTarget;

pub trait HeaderView: Copy {
    fn height(&self) -> u64;

    /// Block timestamp, Unix seconds.
    fn time(&self) -> i64;

    fn bits(&self) -> CompactTarget;

    /// The immediate ancestor, `None` for genesis or when the snapshot ends.
    fn previous(&self) -> Option<Self>;

    /// The header `steps` blocks back, walking one link at a time.
    fn ancestor(&self, steps: u64) -> Option<Self> {
        let mut header = *self;
        for _ in 0..steps {
            header = header.previous()?;
        }
        Some(header)
    }
}

/// The timing fields of a header the consensus core reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub time: i64,
    pub bits: CompactTarget,
}

/// Headers indexed by height, genesis first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderChain {
    headers: Vec<BlockHeader>,
}

impl HeaderChain {
    pub fn new() -> Self {
        HeaderChain::default()
    }

    pub fn from_headers(headers: Vec<BlockHeader>) -> Self {
        HeaderChain { headers }
    }

    pub fn push(&mut self, header: BlockHeader) {
        self.headers.push(header);
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[BlockHeader] {
        &self.headers
    }

    pub fn tip(&self) -> Option<HeaderRef<'_>> {
        HeaderRef::tip_of(&self.headers)
    }

    pub fn at(&self, height: u64) -> Option<HeaderRef<'_>> {
        HeaderRef::at(&self.headers, height)
    }
}

/// A position in a borrowed slice of headers, where index == height.
#[derive(Debug, Clone, Copy)]
pub struct HeaderRef<'a> {
    headers: &'a [BlockHeader],
    height: usize,
}

impl<'a> HeaderRef<'a> {
    pub fn tip_of(headers: &'a [BlockHeader]) -> Option<Self> {
        let height = headers.len().checked_sub(1)?;
        Some(HeaderRef { headers, height })
    }

    pub fn at(headers: &'a [BlockHeader], height: u64) -> Option<Self> {
        let height = usize::try_from(height).ok()?;
        (height < headers.len()).then_some(HeaderRef { headers, height })
    }

    pub fn header(&self) -> &'a BlockHeader {
        &self.headers[self.height]
    }
}

impl HeaderView for HeaderRef<'_> {
    fn height(&self) -> u64 {
        self.height as u64
    }

    fn time(&self) -> i64 {
        self.header().time
    }

    fn bits(&self) -> CompactTarget {
        self.header().bits
    }

    fn previous(&self) -> Option<Self> {
        let height = self.height.checked_sub(1)?;
        Some(HeaderRef {
            headers: self.headers,
            height,
        })
    }

    fn ancestor(&self, steps: u64) -> Option<Self> {
        let steps = usize::try_from(steps).ok()?;
        let height = self.height.checked_sub(steps)?;
        Some(HeaderRef {
            headers: self.headers,
            height,
        })
    }
}
