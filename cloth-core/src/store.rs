//! Ping-pong storage for the simulation.
//!
//! [`GridStore`] owns the two alternating grids and the [`Presenter`] that
//! holds the display grid. A step reads one grid and writes the other; the
//! roles swap on [`GridStore::advance`]. Borrows handed out by
//! [`GridStore::step_buffers`] cannot outlive the call site, so no caller
//! keeps a reference to either grid across a swap.

use crate::{grid::Grid, present::Presenter};

/// Borrowed view of the grids one step works with.
#[derive(Debug)]
pub struct StepBuffers<'a> {
    /// Result of the previous step.
    pub read: &'a Grid,
    /// Destination of this step.
    pub write: &'a mut Grid,
    /// Last presented grid.
    pub display: &'a Grid,
}

#[derive(Debug)]
pub struct GridStore {
    buffers: [Grid; 2],
    presenter: Presenter,
    step: u64,
}

impl GridStore {
    /// Seeds both alternating grids and the display grid with `rest`.
    pub fn new(rest: Grid) -> Self {
        Self {
            buffers: [rest.clone(), rest.clone()],
            presenter: Presenter::new(rest),
            step: 0,
        }
    }

    /// Index (`0` = A, `1` = B) of the grid the current step reads.
    ///
    /// Even steps read A, odd steps read B.
    #[inline]
    pub fn read_index(&self) -> usize {
        (self.step % 2) as usize
    }

    /// Index of the grid the current step writes; always the other one.
    #[inline]
    pub fn write_index(&self) -> usize {
        1 - self.read_index()
    }

    #[inline]
    pub fn read_buffer(&self) -> &Grid {
        &self.buffers[self.read_index()]
    }

    #[inline]
    pub fn write_buffer(&self) -> &Grid {
        &self.buffers[self.write_index()]
    }

    /// Splits the store into the read, write and display grids of the
    /// current step.
    pub fn step_buffers(&mut self) -> StepBuffers<'_> {
        let read_a = self.read_index() == 0;
        let (a, b) = self.buffers.split_at_mut(1);
        let (read, write) = if read_a {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        };

        StepBuffers {
            read,
            write,
            display: self.presenter.display(),
        }
    }

    /// Publishes the current write grid to the display grid.
    pub fn present(&mut self) {
        let write = self.write_index();
        self.presenter.present(&self.buffers[write]);
    }

    /// Flips read/write roles. Call exactly once per completed step.
    pub fn advance(&mut self) {
        self.step += 1;
    }

    #[inline]
    pub fn display(&self) -> &Grid {
        self.presenter.display()
    }

    #[inline]
    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Number of completed steps.
    #[inline]
    pub fn step_count(&self) -> u64 {
        self.step
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.display().resolution()
    }
}
