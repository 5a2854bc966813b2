use crate::grid::Grid;

/// The copy stage that owns the externally visible display grid.
///
/// It is created once per simulation and reused every frame. The only way
/// to change the display grid is [`Presenter::present`], which replaces it
/// as a whole with a completed step.
#[derive(Debug)]
pub struct Presenter {
    display: Grid,
    presented: u64,
}

impl Presenter {
    /// Creates a presenter whose display starts out as `initial`.
    pub fn new(initial: Grid) -> Self {
        Self {
            display: initial,
            presented: 0,
        }
    }

    /// Publishes `written` as the new display grid, value for value.
    ///
    /// ### Panics
    /// Panics if `written` has a different resolution than the display.
    pub fn present(&mut self, written: &Grid) {
        self.display.copy_from(written);
        self.presented += 1;
    }

    #[inline]
    pub fn display(&self) -> &Grid {
        &self.display
    }

    /// Number of grids published since construction.
    #[inline]
    pub fn presented(&self) -> u64 {
        self.presented
    }
}
