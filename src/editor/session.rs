//! One editing session.
//!
//! A [`Session`] is constructed once per editing session and owns all
//! mutable editor state. Every content edit runs through it and ends in a
//! single history snapshot; the pixel-view toggle is display-only and never
//! snapshots.
//!
//! While a batch rebuild is in progress the session is *building*: build,
//! erase, scale, undo and new loads are ignored (reported as
//! [`SkipReason::Busy`]) rather than queued.

use crate::core::config::EditorConfig;
use crate::core::types::{Result, Vec3};
use crate::render::VoxelRenderer;
use crate::voxel::edit::{self, codec, BatchLoad, BatchProgress, CodecError, History, ScaleFactors};
use crate::voxel::grid::GridSpec;
use crate::voxel::pick::PointerHit;
use crate::voxel::store::VoxelStore;
use crate::voxel::voxel::Color;
use super::mode::EditMode;

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

/// Why an operation did nothing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A batch rebuild holds the store
    Busy,
    /// The active mode does not allow this operation
    WrongMode,
    /// Build target cell already holds a voxel
    Occupied,
    /// No cube under the pointer, or nothing to erase
    Missed,
    /// Undo at the oldest recorded entry
    AtOldestEntry,
    /// Target cell lies outside the addressable grid
    OutOfRange,
}

/// Result of a session operation that cannot fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// Editor state for one session
pub struct Session<R: VoxelRenderer> {
    config: EditorConfig,
    store: VoxelStore<R>,
    history: History,
    mode: EditMode,
    color: Color,
    /// Held for the duration of a batch rebuild
    building: bool,
    batch: Option<BatchLoad>,
}

impl<R: VoxelRenderer> Session<R> {
    /// Start a session with a single voxel at the origin and one snapshot
    pub fn new(config: EditorConfig, renderer: R) -> Result<Self> {
        config.validate()?;

        let grid = GridSpec::new(config.voxel_size);
        let mut store = VoxelStore::new(grid, renderer);
        store.create(Vec3::ZERO, config.default_color, Vec3::ONE);

        let mut history = History::new();
        history.snapshot(&store);

        log::info!("session started (voxel size {})", config.voxel_size);

        Ok(Self {
            color: config.default_color,
            config,
            store,
            history,
            mode: EditMode::default(),
            building: false,
            batch: None,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &VoxelStore<R> {
        &self.store
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        self.store.renderer_mut()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn grid(&self) -> &GridSpec {
        self.store.grid()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        log::debug!("mode {} -> {}", self.mode, mode);
        self.mode = mode;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Color used by subsequent builds and never-empty restores
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn is_building(&self) -> bool {
        self.building
    }

    pub fn is_pixel_view(&self) -> bool {
        self.store.is_pixel_view()
    }

    /// (remaining, total) of the running batch load
    pub fn load_progress(&self) -> Option<(usize, usize)> {
        self.batch.as_ref().map(|b| (b.remaining(), b.total()))
    }

    /// Route a primary pointer action according to the active mode
    pub fn primary_action(&mut self, hit: Option<PointerHit>) -> Outcome {
        let Some(hit) = hit else {
            return Outcome::Skipped(SkipReason::Missed);
        };
        match self.mode {
            EditMode::Build => self.build(hit.position, hit.normal),
            EditMode::Erase => self.erase(hit.position),
            _ => Outcome::Skipped(SkipReason::WrongMode),
        }
    }

    /// Place a voxel in the active color next to the hit face
    pub fn build(&mut self, hit_position: Vec3, face_normal: Vec3) -> Outcome {
        if let Some(skip) = self.gate(EditMode::Build) {
            return Outcome::Skipped(skip);
        }

        let Some(target) = self.grid().neighbor_cell(hit_position, face_normal) else {
            log::warn!("build: neighbor of {} is outside the grid", hit_position);
            return Outcome::Skipped(SkipReason::OutOfRange);
        };
        if !self.store.create(target, self.color, Vec3::ONE) {
            return Outcome::Skipped(SkipReason::Occupied);
        }
        self.history.snapshot(&self.store);
        Outcome::Applied
    }

    /// Remove the hit voxel
    pub fn erase(&mut self, hit_position: Vec3) -> Outcome {
        if let Some(skip) = self.gate(EditMode::Erase) {
            return Outcome::Skipped(skip);
        }

        if !self.store.remove(hit_position) {
            return Outcome::Skipped(SkipReason::Missed);
        }
        self.history.snapshot(&self.store);
        Outcome::Applied
    }

    fn gate(&self, required: EditMode) -> Option<SkipReason> {
        if self.building {
            Some(SkipReason::Busy)
        } else if self.mode != required {
            Some(SkipReason::WrongMode)
        } else {
            None
        }
    }

    /// Replace every voxel by a block of unit voxels.
    ///
    /// The tiled result is computed before the store is touched, so a
    /// rejected scale (too many voxels, or past the grid edge) changes
    /// nothing.
    pub fn scale(&mut self, factors: ScaleFactors, replicate_y: bool) -> Result<Outcome> {
        if self.building {
            return Ok(Outcome::Skipped(SkipReason::Busy));
        }

        let tiled = edit::scale::tile(&self.store.snapshot_all(), self.grid(), factors, replicate_y)
            .inspect_err(|e| log::warn!("scale rejected: {}", e))?;

        self.building = true;
        self.store.clear();
        for record in &tiled {
            self.store.create_record(record);
        }
        self.building = false;

        log::info!(
            "scaled by {}x{}x{} (y {}): {} voxels",
            factors.x, factors.y, factors.z,
            if replicate_y { "on" } else { "off" },
            self.store.len()
        );
        self.history.snapshot(&self.store);
        Ok(Outcome::Applied)
    }

    /// Parse prompt text and scale; invalid input changes nothing
    pub fn scale_from_input(&mut self, x: &str, y: &str, z: &str, replicate_y: bool) -> Result<Outcome> {
        let factors = ScaleFactors::parse(x, y, z).inspect_err(|e| log::warn!("scale rejected: {}", e))?;
        self.scale(factors, replicate_y)
    }

    /// Flip the display-only pixel-view transform. Returns the new state.
    pub fn toggle_pixel_view(&mut self) -> bool {
        let on = !self.store.is_pixel_view();
        self.store.set_pixel_view(on.then_some(self.config.pixel_view_scale));
        on
    }

    /// Restore the previous history entry
    pub fn undo(&mut self) -> Outcome {
        if self.building {
            return Outcome::Skipped(SkipReason::Busy);
        }

        let Some(entry) = self.history.undo().cloned() else {
            log::info!("undo: already at oldest entry");
            return Outcome::Skipped(SkipReason::AtOldestEntry);
        };
        edit::restore(&entry, &mut self.store, self.color);
        log::debug!("undo -> entry {:?} ({} voxels)", self.history.index(), self.store.len());
        Outcome::Applied
    }

    /// Save code for the current contents
    pub fn export(&self) -> String {
        codec::encode_store(&self.store)
    }

    /// Decode a save code and start rebuilding the store from it.
    ///
    /// A malformed code is rejected before anything changes. On success the
    /// store is cleared and voxels appear over subsequent [`Session::tick`]
    /// calls; one snapshot is taken when the batch drains.
    pub fn begin_load(&mut self, code: &str) -> Result<Outcome> {
        if self.building {
            log::debug!("load ignored: batch in progress");
            return Ok(Outcome::Skipped(SkipReason::Busy));
        }

        let mut records = codec::decode(code).inspect_err(|e| log::warn!("load rejected: {}", e))?;

        let grid = *self.grid();
        for (i, record) in records.iter_mut().enumerate() {
            let axes = record.position.to_array();
            if let Some(axis) = axes.iter().position(|&c| !grid.axis_in_range(c)) {
                let err = CodecError::OutOfRange { record: i, field: AXIS_NAMES[axis], value: axes[axis] };
                log::warn!("load rejected: {}", err);
                return Err(err.into());
            }
            if !grid.is_aligned(record.position) {
                log::warn!("load: voxel {} at {} is off-grid, snapping", i, record.position);
            }
            if let Some(snapped) = grid.snap(record.position) {
                record.position = snapped;
            }
        }

        log::info!("loading {} voxels", records.len());
        self.store.clear();
        self.building = true;
        self.batch = Some(BatchLoad::new(records));
        Ok(Outcome::Applied)
    }

    /// Advance the running batch load by one step.
    ///
    /// Returns None when no load is running.
    pub fn tick(&mut self) -> Option<BatchProgress> {
        let batch = self.batch.as_mut()?;
        let progress = batch.step(&mut self.store, self.config.load_batch_size);

        if progress == BatchProgress::Done {
            if let Some(batch) = self.batch.take() {
                log::info!(
                    "loaded {} voxels ({} duplicates skipped)",
                    batch.total() - batch.skipped(),
                    batch.skipped()
                );
            }
            self.building = false;
            self.history.snapshot(&self.store);
        }
        Some(progress)
    }

    /// Drive any running batch load to completion
    pub fn finish_load(&mut self) {
        while let Some(BatchProgress::Pending { .. }) = self.tick() {}
    }

    /// Decode and rebuild in one call
    pub fn load(&mut self, code: &str) -> Result<Outcome> {
        let outcome = self.begin_load(code)?;
        if outcome.is_applied() {
            self.finish_load();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::render::{InstanceRenderer, NullRenderer};
    use crate::voxel::grid::MAX_CELL;
    use crate::voxel::voxel::VoxelRecord;

    const RED: Color = Color::from_hex(0xff0000);

    fn session() -> Session<NullRenderer> {
        Session::new(EditorConfig::default(), NullRenderer::new()).unwrap()
    }

    #[test]
    fn test_new_session_has_seed_voxel() {
        let session = session();
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.export(), "(0)(0)(0)(#00ffff)(1)(1)(1)");
        assert_eq!(session.history().index(), Some(0));
        assert_eq!(session.mode(), EditMode::Build);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EditorConfig { voxel_size: 0.0, ..Default::default() };
        assert!(matches!(Session::new(config, NullRenderer::new()), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_build_on_face() {
        let mut session = session();
        session.set_color(RED);

        assert_eq!(session.build(Vec3::ZERO, Vec3::Y), Outcome::Applied);
        let voxel = session.store().get(Vec3::Y).unwrap();
        assert_eq!(voxel.color(), RED);
        assert_eq!(session.history().len(), 2);

        assert_eq!(session.build(Vec3::ZERO, Vec3::Y), Outcome::Skipped(SkipReason::Occupied));
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_build_and_erase_check_mode() {
        let mut session = session();
        assert_eq!(session.erase(Vec3::ZERO), Outcome::Skipped(SkipReason::WrongMode));

        session.set_mode(EditMode::Erase);
        assert_eq!(session.build(Vec3::ZERO, Vec3::X), Outcome::Skipped(SkipReason::WrongMode));
        assert_eq!(session.erase(Vec3::ZERO), Outcome::Applied);
        assert!(session.store().is_empty());
        assert_eq!(session.erase(Vec3::ZERO), Outcome::Skipped(SkipReason::Missed));

        session.set_mode(EditMode::Orbit);
        let hit = PointerHit { position: Vec3::ZERO, normal: Vec3::X, distance: 1.0 };
        assert_eq!(session.primary_action(Some(hit)), Outcome::Skipped(SkipReason::WrongMode));
        assert_eq!(session.primary_action(None), Outcome::Skipped(SkipReason::Missed));
    }

    #[test]
    fn test_primary_action_routes_by_mode() {
        let mut session = session();
        let hit = PointerHit { position: Vec3::ZERO, normal: Vec3::NEG_Z, distance: 1.0 };
        assert!(session.primary_action(Some(hit)).is_applied());
        assert!(session.store().contains(Vec3::NEG_Z));

        session.set_mode(EditMode::Erase);
        assert!(session.primary_action(Some(hit)).is_applied());
        assert!(!session.store().contains(Vec3::ZERO));
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut session = session();
        session.build(Vec3::ZERO, Vec3::X);
        session.build(Vec3::X, Vec3::X);
        assert_eq!(session.store().len(), 3);

        assert!(session.undo().is_applied());
        assert_eq!(session.store().len(), 2);
        assert!(!session.store().contains(Vec3::new(2.0, 0.0, 0.0)));

        assert!(session.undo().is_applied());
        assert_eq!(session.undo(), Outcome::Skipped(SkipReason::AtOldestEntry));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_edit_after_undo_truncates_history() {
        let mut session = session();
        session.build(Vec3::ZERO, Vec3::X); // B
        session.build(Vec3::X, Vec3::X); // C
        session.undo();
        session.build(Vec3::ZERO, Vec3::Y); // D

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), Some(2));
        let current = history.current().unwrap();
        assert_eq!(current.len(), 3);
        assert!(current.records().iter().any(|r| r.position == Vec3::Y));
        assert!(!current.records().iter().any(|r| r.position == Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_undo_to_empty_entry_keeps_one_voxel() {
        let mut session = session();
        session.set_mode(EditMode::Erase);
        session.erase(Vec3::ZERO);
        session.set_mode(EditMode::Build);
        session.set_color(RED);
        session.build(Vec3::ZERO, Vec3::X);
        // Store now holds (1,0,0); the previous entry is empty
        assert!(session.undo().is_applied());
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().get(Vec3::ZERO).unwrap().color(), RED);
    }

    #[test]
    fn test_scale_expands_cardinality() {
        let mut session = session();
        let factors = ScaleFactors::new(2, 1, 3).unwrap();
        assert!(session.scale(factors, false).unwrap().is_applied());

        assert_eq!(session.store().len(), 6);
        for i in 0..2 {
            for k in 0..3 {
                assert!(session.store().contains(Vec3::new(i as f32, 0.0, k as f32)));
            }
        }
        assert!(session.store().iter().all(|v| v.color() == Color::from_hex(0x00ffff)));
        assert_eq!(session.history().len(), 2);
        assert!(!session.is_building());
    }

    #[test]
    fn test_scale_resets_voxel_scale() {
        let mut session = session();
        session.load("(0)(0)(0)(#ff0000)(2)(3)(4)").unwrap();
        session.scale(ScaleFactors::new(1, 1, 1).unwrap(), true).unwrap();
        assert_eq!(session.export(), "(0)(0)(0)(#ff0000)(1)(1)(1)");
    }

    #[test]
    fn test_invalid_scale_input_changes_nothing() {
        let mut session = session();
        session.build(Vec3::ZERO, Vec3::X);
        let before = session.export();
        let history_len = session.history().len();

        for (x, y, z) in [("0", "1", "1"), ("2", "-1", "1"), ("a", "1", "1"), ("1", "1", "")] {
            assert!(matches!(session.scale_from_input(x, y, z, true), Err(Error::InvalidScale(_))));
        }
        assert_eq!(session.export(), before);
        assert_eq!(session.history().len(), history_len);

        // Two adjacent voxels tiled 2x2x1 overlap in one column
        assert!(session.scale_from_input("2", "2", "1", true).unwrap().is_applied());
        assert_eq!(session.store().len(), 6);
    }

    #[test]
    fn test_pixel_view_does_not_snapshot() {
        let mut session = Session::new(EditorConfig::default(), InstanceRenderer::new()).unwrap();
        let history_len = session.history().len();
        let code = session.export();

        assert!(session.toggle_pixel_view());
        assert!(session.is_pixel_view());
        assert_eq!(session.store().iter().next().unwrap().display().scale, Vec3::splat(0.2));
        assert_eq!(session.export(), code);

        assert!(!session.toggle_pixel_view());
        assert_eq!(session.store().iter().next().unwrap().display().scale, Vec3::ONE);
        assert_eq!(session.history().len(), history_len);
    }

    #[test]
    fn test_batch_load_gates_edits() {
        let mut session = session();
        let code = "(0)(0)(0)(#ff0000)(1)(1)(1)(1)(0)(0)(#00ff00)(1)(1)(1)(2)(0)(0)(#0000ff)(1)(1)(1)";

        assert!(session.begin_load(code).unwrap().is_applied());
        assert!(session.is_building());
        assert!(session.store().is_empty());
        assert_eq!(session.load_progress(), Some((3, 3)));

        assert_eq!(session.build(Vec3::ZERO, Vec3::Y), Outcome::Skipped(SkipReason::Busy));
        assert_eq!(session.undo(), Outcome::Skipped(SkipReason::Busy));
        assert_eq!(session.begin_load(code).unwrap(), Outcome::Skipped(SkipReason::Busy));
        assert_eq!(
            session.scale(ScaleFactors::new(2, 2, 2).unwrap(), true).unwrap(),
            Outcome::Skipped(SkipReason::Busy)
        );

        assert_eq!(session.tick(), Some(BatchProgress::Pending { remaining: 2 }));
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.history().len(), 1);

        session.tick();
        assert_eq!(session.tick(), Some(BatchProgress::Done));
        assert!(!session.is_building());
        assert_eq!(session.tick(), None);

        // Exactly one snapshot for the whole load
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.export(), code);
    }

    #[test]
    fn test_malformed_code_changes_nothing() {
        let mut session = session();
        let before = session.export();

        assert!(matches!(session.load("not a code"), Err(Error::Codec(_))));
        assert!(matches!(session.load("(0)(0)(0)(#00ffff)(1)(Infinity)(1)"), Err(Error::Codec(_))));
        assert!(!session.is_building());
        assert_eq!(session.export(), before);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_load_snaps_off_grid_positions() {
        let mut session = session();
        session.load("(0.4)(1.6)(-2.2)(#ffffff)(1)(1)(1)").unwrap();
        let records = session.store().snapshot_all();
        assert_eq!(records, vec![VoxelRecord::unit(Vec3::new(0.0, 2.0, -2.0), Color::from_hex(0xffffff))]);
    }

    #[test]
    fn test_load_then_undo_returns_to_previous() {
        let mut session = session();
        session.load("(5)(5)(5)(#123456)(1)(1)(1)").unwrap();
        assert!(session.undo().is_applied());
        assert_eq!(session.export(), "(0)(0)(0)(#00ffff)(1)(1)(1)");
    }

    #[test]
    fn test_batch_size_from_config() {
        let config = EditorConfig { load_batch_size: 2, ..Default::default() };
        let mut session = Session::new(config, NullRenderer::new()).unwrap();
        session.begin_load("(0)(0)(0)(#000000)(1)(1)(1)(1)(0)(0)(#000000)(1)(1)(1)(2)(0)(0)(#000000)(1)(1)(1)").unwrap();
        assert_eq!(session.tick(), Some(BatchProgress::Pending { remaining: 1 }));
        assert_eq!(session.tick(), Some(BatchProgress::Done));
    }

    #[test]
    fn test_renderer_handles_released_across_edits() {
        let mut session = Session::new(EditorConfig::default(), InstanceRenderer::new()).unwrap();
        session.build(Vec3::ZERO, Vec3::X);
        session.scale(ScaleFactors::new(3, 3, 3).unwrap(), true).unwrap();
        session.undo();
        session.load("(0)(0)(0)(#000000)(1)(1)(1)").unwrap();

        assert_eq!(session.store().renderer().live_count(), session.store().len());
    }

    #[test]
    fn test_oversized_scale_changes_nothing() {
        let mut session = session();
        session.build(Vec3::ZERO, Vec3::X);
        let before = session.export();
        let history_len = session.history().len();

        let result = session.scale_from_input("3000000", "3000000", "3000000", true);
        assert!(matches!(result, Err(Error::InvalidScale(_))));
        let result = session.scale_from_input("2147483647", "1", "1", false);
        assert!(matches!(result, Err(Error::InvalidScale(_))));
        assert!(matches!(session.scale_from_input("2147483648", "1", "1", false), Err(Error::InvalidScale(_))));

        assert_eq!(session.export(), before);
        assert_eq!(session.history().len(), history_len);
        assert_eq!(session.store().renderer().live_count(), 2);
        assert!(!session.is_building());
    }

    #[test]
    fn test_load_rejects_cells_outside_grid() {
        let mut session = session();
        let before = session.export();

        let code = "(3e9)(0)(0)(#ff0000)(1)(1)(1)(4e9)(0)(0)(#00ff00)(1)(1)(1)";
        match session.load(code) {
            Err(Error::Codec(CodecError::OutOfRange { record: 0, field: "x", .. })) => {}
            other => panic!("unexpected {:?}", other),
        }
        let code = "(0)(0)(0)(#ff0000)(1)(1)(1)(0)(0)(-1e300)(#00ff00)(1)(1)(1)";
        assert!(matches!(
            session.load(code),
            Err(Error::Codec(CodecError::InvalidNumber { record: 1, field: "z", .. }))
        ));
        let code = "(0)(0)(0)(#ff0000)(1)(1)(1)(0)(-5e6)(0)(#00ff00)(1)(1)(1)";
        assert!(matches!(
            session.load(code),
            Err(Error::Codec(CodecError::OutOfRange { record: 1, field: "y", .. }))
        ));

        assert_eq!(session.export(), before);
        assert_eq!(session.history().len(), 1);
        assert!(!session.is_building());
    }

    #[test]
    fn test_build_at_grid_edge_is_skipped() {
        let mut session = session();
        let edge = Vec3::new(MAX_CELL as f32, 0.0, 0.0);
        session.load(&format!("({})(0)(0)(#ff0000)(1)(1)(1)", MAX_CELL)).unwrap();
        assert!(session.store().contains(edge));
        let history_len = session.history().len();

        assert_eq!(session.build(edge, Vec3::X), Outcome::Skipped(SkipReason::OutOfRange));
        assert_eq!(session.build(Vec3::new(3e9, 0.0, 0.0), Vec3::NEG_X), Outcome::Skipped(SkipReason::OutOfRange));
        assert_eq!(session.history().len(), history_len);

        assert!(session.build(edge, Vec3::NEG_X).is_applied());
        assert_eq!(session.store().len(), 2);
    }
}
