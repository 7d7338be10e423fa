#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative editing session for the isometric garden.
//!
//! [`GardenSession`] owns the camera, the layout, the inventory ledger and the
//! interaction state. Input is turned into [`Command`] values by the
//! interaction system and applied in order through [`apply`], which reports
//! what happened as [`Event`] values. Remote writes are never performed here:
//! they are queued as [`RemoteRequest`] values that the host drains and hands
//! to a worker, feeding the outcomes back through
//! [`GardenSession::complete_remote`].

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use iso_garden_catalog::Catalog;
use iso_garden_core::{
    Camera, Command, Event, GridCoord, InputEvent, InventoryEntry, PersistedTile, PlantId,
    Viewport, ZoomLimits,
};
use iso_garden_inventory::{InventoryLedger, StockPolicy, DEFAULT_SYNC_WINDOW};
use iso_garden_layout::{LayoutError, LayoutSnapshot, LayoutStore};
use iso_garden_persistence::{
    CacheError, LoadedLayout, LocalCache, RemoteOp, RemoteOutcome, RemoteRequest,
};
use iso_garden_projection::zoom_at;
use iso_garden_system_interaction::{Interaction, InteractionContext};
use tracing::{debug, info, warn};

/// Radius searched around an occupied drop cell.
pub const DEFAULT_DROP_SEARCH_RADIUS: u32 = 6;

/// Plant selected when a session starts.
pub const DEFAULT_SELECTION: &str = "carnation";

/// Tunables supplied by the host when a session is created.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSettings {
    /// Camera used when no cached view is available, and as the fallback for unusable components.
    pub camera: Camera,
    /// Accepted zoom range.
    pub zoom_limits: ZoomLimits,
    /// Initial drawing surface.
    pub viewport: Viewport,
    /// Quiet period before touched inventory counters are written.
    pub sync_window: Duration,
    /// Radius searched by [`Command::DropTile`] when the drop cell is taken.
    pub drop_search_radius: u32,
    /// Persistent identity; `None` runs an anonymous session with unlimited stock and no remote writes.
    pub profile: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            zoom_limits: ZoomLimits::default(),
            viewport: Viewport::new(1280.0, 720.0),
            sync_window: DEFAULT_SYNC_WINDOW,
            drop_search_radius: DEFAULT_DROP_SEARCH_RADIUS,
            profile: None,
        }
    }
}

/// Translucent tile drawn at a cell without being part of the layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    /// Plant type shown.
    pub plant: PlantId,
    /// Cell the preview is drawn at.
    pub cell: GridCoord,
}

/// Explicit editing session replacing ambient view state.
#[derive(Debug)]
pub struct GardenSession {
    catalog: Catalog,
    camera: Camera,
    default_camera: Camera,
    limits: ZoomLimits,
    viewport: Viewport,
    layout: LayoutStore,
    ledger: InventoryLedger,
    interaction: Interaction,
    selected: PlantId,
    drop_search_radius: u32,
    profile: Option<String>,
    cache: LocalCache,
    cache_stale: bool,
    cache_failing: bool,
    dirty: bool,
    outbox: Vec<RemoteRequest>,
    next_request_id: u64,
    saved: LayoutSnapshot,
    pending_saves: BTreeMap<u64, LayoutSnapshot>,
}

impl GardenSession {
    /// Creates a session with an empty layout and the default inventory.
    #[must_use]
    pub fn new(settings: SessionSettings, catalog: Catalog, cache: LocalCache) -> Self {
        let policy = if settings.profile.is_some() {
            StockPolicy::Limited
        } else {
            StockPolicy::Unlimited
        };
        let limits = settings.zoom_limits;
        let default_camera = settings.camera.sanitized(Camera::default(), limits);
        Self {
            catalog,
            camera: default_camera,
            default_camera,
            limits,
            viewport: settings.viewport,
            layout: LayoutStore::new(),
            ledger: InventoryLedger::with_defaults(policy, settings.sync_window),
            interaction: Interaction::new(),
            selected: PlantId::from(DEFAULT_SELECTION),
            drop_search_radius: settings.drop_search_radius,
            profile: settings.profile,
            cache,
            cache_stale: false,
            cache_failing: false,
            dirty: true,
            outbox: Vec::new(),
            next_request_id: 0,
            saved: LayoutSnapshot::default(),
            pending_saves: BTreeMap::new(),
        }
    }

    /// Adopts a loaded layout and, when present, its sanitised camera hint.
    ///
    /// The adopted layout becomes the saved baseline.
    pub fn adopt(&mut self, loaded: LoadedLayout) {
        self.layout.load(&loaded.tiles);
        if let Some(camera) = loaded.camera {
            self.camera = camera.sanitized(self.default_camera, self.limits);
        }
        self.interaction = Interaction::new();
        self.saved = self.layout.snapshot();
        self.dirty = true;
        info!(
            tiles = self.layout.len(),
            source = ?loaded.source,
            zoom = self.camera.zoom,
            "layout adopted"
        );
    }

    /// Adds remotely stored inventory on top of the current stock.
    pub fn merge_inventory(&mut self, rows: &[InventoryEntry]) {
        self.ledger.merge_remote(rows);
        self.dirty = true;
    }

    /// Grants purchased or earned instances of a plant.
    pub fn grant(&mut self, plant: &PlantId, amount: u32, out_events: &mut Vec<Event>) {
        let before = query::selected(self);
        self.ledger.grant(plant, amount);
        self.push_quantity(plant, out_events);
        self.push_selection_change(before, out_events);
        self.dirty = true;
    }

    /// Routes one input event through the interaction system and applies the resulting commands.
    pub fn handle_input(&mut self, event: &InputEvent, out_events: &mut Vec<Event>) {
        let selectable = query::selectable(self);
        let selected = query::selected(self);
        let before = self.interaction.state().clone();
        let mut commands = Vec::new();
        let context = InteractionContext {
            projection: query::projection(self),
            selected: selected.as_ref(),
            selectable: &selectable,
            occupancy: &self.layout,
        };
        self.interaction.handle(event, &context, &mut commands);
        if self.interaction.state() != &before {
            self.dirty = true;
        }
        for command in commands {
            apply(self, command, out_events);
        }
    }

    /// Advances timers: ships due inventory batches and rewrites a stale local cache.
    ///
    /// A failed cache write leaves the cache stale, so the next tick retries it.
    pub fn tick(&mut self, elapsed: Duration) {
        if let Some(rows) = self.ledger.tick(elapsed) {
            if !rows.is_empty() {
                self.queue(RemoteOp::UpsertInventory(rows));
            }
        }
        if self.cache_stale {
            let _ = self.write_cache();
        }
    }

    /// Writes the layout locally and asks the remote store to replace its copy.
    ///
    /// Pending inventory writes are flushed first. Anonymous sessions finish
    /// immediately; otherwise the outcome arrives through
    /// [`GardenSession::complete_remote`].
    pub fn save(&mut self, out_events: &mut Vec<Event>) {
        self.flush_inventory();
        let tiles = self.layout.persisted();
        let snapshot = LayoutSnapshot::from_rows(&tiles);
        let cached = self.write_cache();
        out_events.push(Event::SaveStarted);
        info!(tiles = tiles.len(), "manual save started");

        match self.enqueue(RemoteOp::SyncLayout(tiles)) {
            Some(id) => {
                let _ = self.pending_saves.insert(id, snapshot);
            }
            None => match cached {
                Ok(()) => {
                    self.saved = snapshot;
                    out_events.push(Event::SaveSucceeded);
                }
                Err(error) => out_events.push(Event::SaveFailed {
                    reason: error.to_string(),
                }),
            },
        }
    }

    /// Records the result of a remote write issued by this session.
    pub fn complete_remote(&mut self, outcome: &RemoteOutcome, out_events: &mut Vec<Event>) {
        match (self.pending_saves.remove(&outcome.id), &outcome.error) {
            (Some(snapshot), None) => {
                self.saved = snapshot;
                info!(id = outcome.id, "manual save confirmed");
                out_events.push(Event::SaveSucceeded);
            }
            (Some(_), Some(reason)) => {
                warn!(id = outcome.id, reason = %reason, "manual save kept local only");
                out_events.push(Event::SaveFailed {
                    reason: reason.clone(),
                });
            }
            (None, Some(reason)) => out_events.push(Event::RemoteWriteFailed {
                operation: outcome.operation,
                reason: reason.clone(),
            }),
            (None, None) => {}
        }
    }

    /// Takes every queued remote request in issue order.
    pub fn drain_remote_requests(&mut self) -> Vec<RemoteRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Returns and clears the redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        let layout_changed = self.layout.take_dirty();
        std::mem::replace(&mut self.dirty, false) || layout_changed
    }

    /// Tears the session down without losing state.
    ///
    /// Any dragged tile returns to its origin, pending inventory writes are
    /// flushed and the local cache is rewritten. The remaining remote requests
    /// are returned for the host to deliver.
    pub fn unmount(&mut self) -> Vec<RemoteRequest> {
        let _ = self.interaction.cancel();
        for id in self.layout.detached_ids() {
            let Some(origin) = self.layout.detached(id).map(|detached| detached.origin) else {
                continue;
            };
            if let Err(LayoutError::Displaced { tile, .. }) = self.layout.reinsert(id, origin, 0) {
                self.ledger.restore(&tile.plant);
                self.queue(RemoteOp::RemoveTile(tile.to_persisted()));
            }
        }
        self.flush_inventory();
        let _ = self.write_cache();
        let requests = self.drain_remote_requests();
        info!(
            tiles = self.layout.len(),
            requests = requests.len(),
            "session unmounted"
        );
        requests
    }

    fn enqueue(&mut self, op: RemoteOp) -> Option<u64> {
        if self.profile.is_none() {
            return None;
        }
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        debug!(id, operation = op.name(), "remote write queued");
        self.outbox.push(RemoteRequest { id, op });
        Some(id)
    }

    fn queue(&mut self, op: RemoteOp) {
        let _ = self.enqueue(op);
    }

    fn flush_inventory(&mut self) {
        let rows = self.ledger.flush();
        if !rows.is_empty() {
            self.queue(RemoteOp::UpsertInventory(rows));
        }
    }

    fn write_cache(&mut self) -> Result<(), CacheError> {
        let result = self.cache.store(self.layout.persisted(), self.camera);
        match &result {
            Ok(()) => {
                if self.cache_failing {
                    info!(path = %self.cache.path().display(), "local cache writable again");
                }
                self.cache_failing = false;
                self.cache_stale = false;
            }
            Err(error) => {
                if self.cache_failing {
                    debug!(error = %error, "local cache write retry failed");
                } else {
                    warn!(
                        path = %self.cache.path().display(),
                        error = %error,
                        "local cache write failed; retrying every tick"
                    );
                }
                self.cache_failing = true;
                self.cache_stale = true;
            }
        }
        result
    }

    fn layout_changed(&mut self) {
        self.cache_stale = true;
        self.dirty = true;
    }

    fn camera_changed(&mut self, camera: Camera, out_events: &mut Vec<Event>) {
        if camera == self.camera {
            return;
        }
        self.camera = camera;
        self.cache_stale = true;
        self.dirty = true;
        out_events.push(Event::CameraChanged { camera });
    }

    fn push_quantity(&self, plant: &PlantId, out_events: &mut Vec<Event>) {
        out_events.push(Event::InventoryChanged {
            plant: plant.clone(),
            quantity: self.ledger.quantity(plant),
        });
    }

    fn push_selection_change(&self, before: Option<PlantId>, out_events: &mut Vec<Event>) {
        let after = query::selected(self);
        if after != before {
            if let Some(plant) = after {
                out_events.push(Event::SelectionChanged { plant });
            }
        }
    }
}

/// Applies a command to the session, appending the resulting events.
pub fn apply(session: &mut GardenSession, command: Command, out_events: &mut Vec<Event>) {
    let selection_before = query::selected(session);
    match command {
        Command::PlaceTile { plant, cell } => {
            match session.layout.place(&plant, cell, &mut session.ledger) {
                Ok(tile) => {
                    session.queue(RemoteOp::PlaceTile(tile.to_persisted()));
                    session.push_quantity(&plant, out_events);
                    out_events.push(Event::TilePlaced { tile });
                    session.layout_changed();
                }
                Err(reason) => {
                    debug!(plant = %plant, cell = %cell, reason = %reason, "placement rejected");
                    out_events.push(Event::PlacementRejected {
                        plant,
                        cell,
                        reason,
                    });
                    session.dirty = true;
                }
            }
        }
        Command::DetachTile { cell } => {
            if let Some(tile) = session.layout.detach(cell) {
                out_events.push(Event::TileDetached { tile });
                session.dirty = true;
            }
        }
        Command::DropTile { tile, cell } => {
            match session
                .layout
                .reinsert(tile, cell, session.drop_search_radius)
            {
                Ok(reinsertion) => {
                    if reinsertion.tile.cell != reinsertion.origin {
                        session.queue(RemoteOp::RemoveTile(PersistedTile::new(
                            reinsertion.tile.plant.clone(),
                            reinsertion.origin,
                        )));
                        session.queue(RemoteOp::PlaceTile(reinsertion.tile.to_persisted()));
                        session.layout_changed();
                    }
                    debug!(
                        tile = %reinsertion.tile.id,
                        cell = %reinsertion.tile.cell,
                        resolution = ?reinsertion.resolution,
                        "tile dropped"
                    );
                    out_events.push(Event::TileDropped {
                        tile: reinsertion.tile,
                        origin: reinsertion.origin,
                    });
                    session.dirty = true;
                }
                Err(LayoutError::Displaced { tile, cell }) => {
                    warn!(tile = %tile.id, cell = %cell, "dropped tile had nowhere to go; returned to inventory");
                    session.ledger.restore(&tile.plant);
                    session.queue(RemoteOp::RemoveTile(tile.to_persisted()));
                    session.push_quantity(&tile.plant, out_events);
                    out_events.push(Event::TileRemoved { tile });
                    session.layout_changed();
                }
                Err(error @ LayoutError::NotDetached(_)) => {
                    debug!(error = %error, "drop ignored");
                }
            }
        }
        Command::RemoveTile { cell } => {
            if let Some(tile) = session.layout.remove(cell, &mut session.ledger) {
                session.queue(RemoteOp::RemoveTile(tile.to_persisted()));
                session.push_quantity(&tile.plant, out_events);
                out_events.push(Event::TileRemoved { tile });
                session.layout_changed();
            }
        }
        Command::ClearLayout => {
            let _ = session.interaction.cancel();
            let removed = session.layout.clear(&mut session.ledger);
            let plants: BTreeSet<PlantId> = removed.iter().map(|tile| tile.plant.clone()).collect();
            for plant in &plants {
                session.push_quantity(plant, out_events);
            }
            session.queue(RemoteOp::ClearLayout);
            info!(restored = removed.len(), "layout cleared");
            out_events.push(Event::LayoutCleared {
                restored: removed.len(),
            });
            session.layout_changed();
        }
        Command::SetCameraOffset { x, y } => {
            let camera = Camera::new(x, y, session.camera.zoom);
            session.camera_changed(camera, out_events);
        }
        Command::ZoomAt { zoom, anchor } => {
            let camera = zoom_at(
                session.camera,
                session.viewport,
                zoom,
                anchor,
                session.limits,
            );
            session.camera_changed(camera, out_events);
        }
        Command::SelectPlant { plant } => {
            if query::selectable(session).contains(&plant) {
                session.selected = plant;
                session.dirty = true;
            } else {
                debug!(plant = %plant, "selection of unavailable plant ignored");
            }
        }
        Command::ResizeViewport { width, height } => {
            session.viewport = Viewport::new(width, height);
            session.dirty = true;
        }
        Command::ForceSave => session.save(out_events),
        Command::RequestRedraw => session.dirty = true,
    }
    session.push_selection_change(selection_before, out_events);
}

/// Read-only views over a [`GardenSession`].
pub mod query {
    use iso_garden_catalog::Catalog;
    use iso_garden_core::{Camera, GridCoord, Occupancy, PlacedTile, PlantId, Viewport, ZoomLimits};
    use iso_garden_inventory::{InventoryLedger, StockPolicy};
    use iso_garden_layout::LayoutStore;
    use iso_garden_projection::Projection;
    use iso_garden_system_interaction::{InteractionMode, InteractionState};

    use super::{GardenSession, Preview};

    /// Tile type registry used by the session.
    #[must_use]
    pub fn catalog(session: &GardenSession) -> &Catalog {
        &session.catalog
    }

    /// Current camera.
    #[must_use]
    pub fn camera(session: &GardenSession) -> Camera {
        session.camera
    }

    /// Current drawing surface.
    #[must_use]
    pub fn viewport(session: &GardenSession) -> Viewport {
        session.viewport
    }

    /// Accepted zoom range.
    #[must_use]
    pub fn zoom_limits(session: &GardenSession) -> ZoomLimits {
        session.limits
    }

    /// Projection for the current camera and viewport.
    #[must_use]
    pub fn projection(session: &GardenSession) -> Projection {
        Projection::new(session.camera, session.viewport)
    }

    /// Authoritative layout.
    #[must_use]
    pub fn layout(session: &GardenSession) -> &LayoutStore {
        &session.layout
    }

    /// Live inventory ledger.
    #[must_use]
    pub fn ledger(session: &GardenSession) -> &InventoryLedger {
        &session.ledger
    }

    /// Available quantity of the plant.
    #[must_use]
    pub fn quantity(session: &GardenSession, plant: &PlantId) -> u32 {
        session.ledger.quantity(plant)
    }

    /// Transient interaction state.
    #[must_use]
    pub fn interaction(session: &GardenSession) -> &InteractionState {
        session.interaction.state()
    }

    /// Placed tiles in painter's order.
    #[must_use]
    pub fn tiles_in_paint_order(session: &GardenSession) -> Vec<&PlacedTile> {
        session.layout.paint_order()
    }

    /// Plants the selection may use, in catalog order.
    ///
    /// Anonymous sessions may use every catalog plant; others only those in stock.
    #[must_use]
    pub fn selectable(session: &GardenSession) -> Vec<PlantId> {
        let anonymous = session.ledger.policy() == StockPolicy::Unlimited;
        session
            .catalog
            .iter()
            .map(|tile_type| tile_type.plant_id())
            .filter(|plant| anonymous || session.ledger.quantity(plant) >= 1)
            .collect()
    }

    /// Plants shown in the inventory list, in catalog order.
    ///
    /// Profiles see every plant they were ever granted, including those that
    /// ran out; anonymous sessions see the whole catalog.
    #[must_use]
    pub fn listed(session: &GardenSession) -> Vec<PlantId> {
        let anonymous = session.ledger.policy() == StockPolicy::Unlimited;
        session
            .catalog
            .iter()
            .map(|tile_type| tile_type.plant_id())
            .filter(|plant| anonymous || session.ledger.total_granted(plant) > 0)
            .collect()
    }

    /// Plant used for new placements: the chosen one while it is selectable, otherwise the first selectable one.
    #[must_use]
    pub fn selected(session: &GardenSession) -> Option<PlantId> {
        let selectable = selectable(session);
        if selectable.contains(&session.selected) {
            return Some(session.selected.clone());
        }
        selectable.into_iter().next()
    }

    /// Cell under the pointer.
    #[must_use]
    pub fn hovered(session: &GardenSession) -> Option<GridCoord> {
        session.interaction.state().hovered()
    }

    /// Preview of the next placement over an empty hovered cell; hidden during gestures.
    #[must_use]
    pub fn ghost(session: &GardenSession) -> Option<Preview> {
        let state = session.interaction.state();
        if !matches!(
            state.mode(),
            InteractionMode::Idle | InteractionMode::Hovering(_)
        ) {
            return None;
        }
        let cell = state.hovered()?;
        if !session.layout.is_free(cell) {
            return None;
        }
        Some(Preview {
            plant: selected(session)?,
            cell,
        })
    }

    /// Plant following the pointer while a new or existing tile is dragged.
    #[must_use]
    pub fn drag_preview(session: &GardenSession) -> Option<Preview> {
        let state = session.interaction.state();
        match state.mode() {
            InteractionMode::DraggingNew { plant } => state.hovered().map(|cell| Preview {
                plant: plant.clone(),
                cell,
            }),
            InteractionMode::DraggingExisting { plant, origin, .. } => Some(Preview {
                plant: plant.clone(),
                cell: state.hovered().unwrap_or(*origin),
            }),
            _ => None,
        }
    }

    /// Cell whose removal awaits confirmation.
    #[must_use]
    pub fn removal_prompt(session: &GardenSession) -> Option<GridCoord> {
        session.interaction.state().removal_prompt()
    }

    /// Reports whether clearing the garden awaits confirmation.
    #[must_use]
    pub fn clear_prompt(session: &GardenSession) -> bool {
        session.interaction.state().clear_prompt()
    }

    /// Reports whether the layout differs from the last saved or loaded one.
    #[must_use]
    pub fn has_unsaved_changes(session: &GardenSession) -> bool {
        session.layout.snapshot() != session.saved
    }

    /// Reports whether a manual save awaits remote confirmation.
    #[must_use]
    pub fn save_in_flight(session: &GardenSession) -> bool {
        !session.pending_saves.is_empty()
    }

    /// Profile the session writes for, if any.
    #[must_use]
    pub fn profile(session: &GardenSession) -> Option<&str> {
        session.profile.as_deref()
    }

    /// Local cache backing the session.
    #[must_use]
    pub fn cache(session: &GardenSession) -> &iso_garden_persistence::LocalCache {
        &session.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_garden_core::ScreenPoint;
    use iso_garden_persistence::LayoutSource;

    fn session(profile: Option<&str>) -> (GardenSession, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = SessionSettings {
            profile: profile.map(str::to_owned),
            ..SessionSettings::default()
        };
        let cache = LocalCache::for_profile(dir.path(), profile);
        (GardenSession::new(settings, Catalog::builtin(), cache), dir)
    }

    fn sakura() -> PlantId {
        PlantId::from("sakura")
    }

    #[test]
    fn anonymous_sessions_never_queue_remote_writes() {
        let (mut session, _dir) = session(None);
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::PlaceTile {
                plant: PlantId::from("pine"),
                cell: GridCoord::new(0, 0),
            },
            &mut events,
        );
        assert!(matches!(events.last(), Some(Event::TilePlaced { .. })));
        assert!(session.drain_remote_requests().is_empty());
    }

    #[test]
    fn placement_queues_an_incremental_remote_write() {
        let (mut session, _dir) = session(Some("p"));
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::PlaceTile {
                plant: sakura(),
                cell: GridCoord::new(2, 3),
            },
            &mut events,
        );
        let requests = session.drain_remote_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].op,
            RemoteOp::PlaceTile(PersistedTile::new(sakura(), GridCoord::new(2, 3)))
        );
        assert_eq!(query::quantity(&session, &sakura()), 4);
    }

    #[test]
    fn out_of_stock_selection_falls_back_to_first_selectable() {
        let (mut session, _dir) = session(Some("p"));
        let carnation = PlantId::from("carnation");
        let mut events = Vec::new();
        for x in 0..5 {
            apply(
                &mut session,
                Command::PlaceTile {
                    plant: carnation.clone(),
                    cell: GridCoord::new(x, 0),
                },
                &mut events,
            );
        }
        assert_eq!(query::selected(&session), Some(PlantId::from("sprout")));
        assert!(events.contains(&Event::SelectionChanged {
            plant: PlantId::from("sprout")
        }));
        assert!(!query::selectable(&session).contains(&carnation));
    }

    #[test]
    fn selecting_an_unavailable_plant_is_ignored() {
        let (mut session, _dir) = session(Some("p"));
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::SelectPlant {
                plant: PlantId::from("pine"),
            },
            &mut events,
        );
        assert_eq!(query::selected(&session), Some(PlantId::from("carnation")));
        assert!(events.is_empty());
    }

    #[test]
    fn zoom_commands_stay_within_limits() {
        let (mut session, _dir) = session(None);
        let mut events = Vec::new();
        for zoom in [100.0, -5.0, f32::NAN, 0.0, 2.5] {
            apply(
                &mut session,
                Command::ZoomAt {
                    zoom,
                    anchor: ScreenPoint::new(10.0, 10.0),
                },
                &mut events,
            );
            assert!(query::zoom_limits(&session).contains(query::camera(&session).zoom));
        }
    }

    #[test]
    fn adopt_sanitises_cached_camera_and_sets_saved_baseline() {
        let (mut session, _dir) = session(None);
        session.adopt(LoadedLayout {
            tiles: vec![PersistedTile::new(sakura(), GridCoord::new(1, 1))],
            camera: Some(Camera::new(f32::NAN, 4.0, 99.0)),
            source: LayoutSource::Cache,
        });
        assert_eq!(query::camera(&session), Camera::new(0.0, 4.0, 3.0));
        assert!(!query::has_unsaved_changes(&session));
        assert!(session.take_dirty());
        assert!(!session.take_dirty());
    }

    #[test]
    fn stale_cache_is_rewritten_on_tick() {
        let (mut session, _dir) = session(None);
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::PlaceTile {
                plant: sakura(),
                cell: GridCoord::new(0, 0),
            },
            &mut events,
        );
        assert_eq!(query::cache(&session).read().expect("read"), None);
        session.tick(Duration::from_millis(16));
        let envelope = query::cache(&session)
            .read()
            .expect("read")
            .expect("autosaved");
        assert_eq!(envelope.tiles.len(), 1);
    }

    #[test]
    fn failed_cache_write_is_retried_on_the_next_tick() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocked = dir.path().join("cache");
        std::fs::write(&blocked, b"not a directory").expect("blocker");
        let mut session = GardenSession::new(
            SessionSettings::default(),
            Catalog::builtin(),
            LocalCache::for_profile(&blocked, None),
        );
        let mut events = Vec::new();
        apply(
            &mut session,
            Command::PlaceTile {
                plant: sakura(),
                cell: GridCoord::new(0, 0),
            },
            &mut events,
        );
        session.tick(Duration::from_millis(16));
        assert!(session.cache_stale);

        std::fs::remove_file(&blocked).expect("unblock");
        session.tick(Duration::from_millis(16));
        assert!(!session.cache_stale);
        let envelope = query::cache(&session)
            .read()
            .expect("read")
            .expect("written once the directory could be created");
        assert_eq!(
            envelope.tiles,
            vec![PersistedTile::new(sakura(), GridCoord::new(0, 0))]
        );
    }

    #[test]
    fn new_tile_drags_show_the_drag_preview_instead_of_the_ghost() {
        let (mut session, _dir) = session(None);
        let mut events = Vec::new();
        let position = query::projection(&session).world_to_screen(GridCoord::new(2, 0));
        session.handle_input(&InputEvent::PointerMove { position }, &mut events);
        assert!(query::ghost(&session).is_some());

        session.handle_input(
            &InputEvent::PointerDown {
                position,
                button: iso_garden_core::PointerButton::Primary,
            },
            &mut events,
        );
        assert_eq!(query::ghost(&session), None);
        assert_eq!(
            query::drag_preview(&session),
            Some(Preview {
                plant: PlantId::from(DEFAULT_SELECTION),
                cell: GridCoord::new(2, 0),
            })
        );
    }

    #[test]
    fn profiles_list_plants_that_ran_out() {
        let (mut session, _dir) = session(Some("p"));
        let mut events = Vec::new();
        for x in 0..5 {
            apply(
                &mut session,
                Command::PlaceTile {
                    plant: sakura(),
                    cell: GridCoord::new(x, 0),
                },
                &mut events,
            );
        }
        let listed = query::listed(&session);
        assert!(listed.contains(&sakura()));
        assert!(!listed.contains(&PlantId::from("pine")));
        assert!(!query::selectable(&session).contains(&sakura()));
    }

    #[test]
    fn anonymous_sessions_list_the_whole_catalog() {
        let (session, _dir) = session(None);
        assert_eq!(
            query::listed(&session).len(),
            Catalog::builtin().iter().count()
        );
    }

    #[test]
    fn failed_remote_writes_surface_as_events() {
        let (mut session, _dir) = session(Some("p"));
        let mut events = Vec::new();
        session.complete_remote(
            &RemoteOutcome {
                id: 42,
                operation: "place_tile",
                error: Some("offline".to_owned()),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::RemoteWriteFailed {
                operation: "place_tile",
                reason: "offline".to_owned()
            }]
        );
    }
}
