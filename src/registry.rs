//! Page Registry shared between the config core and the scan core.
//!
//! # Architecture
//!
//! ```text
//! Core 1 (config)          PageRegistry              Core 0 (scan)
//! ───────────────          ────────────              ─────────────
//!
//! parse() ──commit()──▶ [p0][p1]..[p8] ──get()──▶ dispatch
//!                        seq (even = stable)
//! ```
//!
//! # Rules
//!
//! - One writer: the config loader. Never called from the scan core.
//! - Any number of readers. Readers copy pages out and never hold references
//!   into the slots.
//! - Slot storage is reserved once, inside the registry, and never moves.
//!   The scan core keeps the registry address for the whole power cycle.
//! - Writes are bracketed by a sequence counter: odd while a commit is in
//!   progress, even when stable. A reader that overlaps a commit retries,
//!   so a half-written page is never observed.
//!
//! A commit replaces the whole page set. Slots not present in the new set
//! become empty in place.

use core::cell::UnsafeCell;
use core::ptr;
use core::sync::atomic::{fence, AtomicBool, AtomicU32, Ordering};

use crate::page::{Keypage, PageSet, MAX_PAGES};

/// Fixed-capacity page table, addressed by page id.
pub struct PageRegistry {
    /// One slot per possible page id.
    slots: UnsafeCell<[Option<Keypage>; MAX_PAGES]>,

    /// Write sequence. Odd while a commit is in progress.
    seq: AtomicU32,

    /// Set by the first commit. Before that the registry holds its
    /// construction-time pages (the built-in default page).
    initialized: AtomicBool,
}

// SAFETY: Single writer, readers validate every copy against `seq`.
// No reference into `slots` ever escapes.
unsafe impl Sync for PageRegistry {}
unsafe impl Send for PageRegistry {}

impl PageRegistry {
    /// Empty registry: every key on every page does nothing.
    pub const fn new() -> Self {
        Self::with_pages(PageSet::new())
    }

    /// Registry holding only the built-in default page 0.
    pub const fn with_default_page() -> Self {
        Self::with_pages(PageSet::with_default())
    }

    const fn with_pages(set: PageSet) -> Self {
        Self {
            slots: UnsafeCell::new(*set.slots()),
            seq: AtomicU32::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    /// Replace the page set (writer side).
    ///
    /// Must only be called from one context.
    pub fn commit(&self, set: &PageSet) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        // SAFETY: Single writer. Readers detect the overlap through `seq`.
        unsafe {
            ptr::write_volatile(self.slots.get(), *set.slots());
        }

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
        self.initialized.store(true, Ordering::Release);
    }

    /// Copy of the page with `page_id`, `None` if that slot is empty.
    #[inline]
    pub fn get(&self, page_id: u8) -> Option<Keypage> {
        self.get_versioned(page_id).1
    }

    /// Page plus the generation it was read from.
    pub fn get_versioned(&self, page_id: u8) -> (u32, Option<Keypage>) {
        let idx = page_id as usize;
        if idx >= MAX_PAGES {
            return (self.generation(), None);
        }
        self.read_consistent(|slots| {
            // SAFETY: idx checked above; value is validated by the caller loop
            unsafe { ptr::read_volatile(ptr::addr_of!((*slots)[idx])) }
        })
    }

    /// Consistent copy of every slot.
    pub fn snapshot(&self) -> PageSet {
        let (_, slots) = self.read_consistent(|slots| {
            // SAFETY: validated by the caller loop
            unsafe { ptr::read_volatile(slots) }
        });
        let mut set = PageSet::new();
        for page in slots.into_iter().flatten() {
            set.insert(page);
        }
        set
    }

    /// Number of completed commits since boot.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.seq.load(Ordering::Acquire) >> 1
    }

    /// True once any configuration has been committed.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Address of the slot storage. Constant for the life of the registry.
    #[inline]
    pub fn storage_addr(&self) -> usize {
        self.slots.get() as usize
    }

    /// Seqlock read loop.
    fn read_consistent<R>(&self, read: impl Fn(*const [Option<Keypage>; MAX_PAGES]) -> R) -> (u32, R) {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                core::hint::spin_loop();
                continue;
            }

            let value = read(self.slots.get() as *const _);

            fence(Ordering::Acquire);
            let after = self.seq.load(Ordering::Relaxed);
            if before == after {
                return (before >> 1, value);
            }
            core::hint::spin_loop();
        }
    }
}

impl Default for PageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
