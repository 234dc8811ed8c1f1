use std::ops::Range;

/// Contiguous chunk `[offset, offset + len)` of the data being written
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Page {
	pub offset: usize,
	pub len: usize,
}

impl Page {
	pub fn range(&self) -> Range<usize> {
		self.offset..self.offset + self.len
	}
}

#[derive(Clone, Debug)]
pub struct Pages {
	offset: usize,
	total: usize,
	page_size: usize,
}

impl Iterator for Pages {
	type Item = Page;

	fn next(&mut self) -> Option<Self::Item> {
		if self.offset >= self.total {
			return None;
		}
		let page = Page {
			offset: self.offset,
			len: std::cmp::min(self.page_size, self.total - self.offset),
		};
		self.offset += page.len;
		Some(page)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let remaining = self.total.saturating_sub(self.offset);
		let n = (remaining + self.page_size - 1) / self.page_size;
		(n, Some(n))
	}
}

impl ExactSizeIterator for Pages {}

/// Split `total` bytes into `page_size` chunks; only the last one may be short.
pub fn pages(total: usize, page_size: usize) -> Pages {
	assert!(page_size > 0);
	Pages {
		offset: 0,
		total,
		page_size,
	}
}
