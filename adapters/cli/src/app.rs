//! Wiring between the session, the remote worker and the render loop.

use anyhow::{Context, Result};
use iso_garden_catalog::Catalog;
use iso_garden_core::Event;
use iso_garden_persistence::{
    load_layout, FileRemote, MemoryRemote, RemoteStore, RemoteWorker,
};
use iso_garden_rendering::{FrameInput, InventorySlot, RenderLoop, Scene, SceneTile};
use iso_garden_session::{query, GardenSession};
use tracing::{debug, info, warn};

use crate::config::GardenConfig;

/// Running editor: the session plus the thread executing its remote writes.
#[derive(Debug)]
pub(crate) struct Editor {
    session: GardenSession,
    worker: Option<RemoteWorker>,
    catalog: Catalog,
}

impl Editor {
    /// Opens the configured profile: fetches inventory and layout, then starts the remote worker.
    ///
    /// Anonymous sessions only read the local cache and never start a worker.
    pub(crate) fn open(config: &GardenConfig, offline: bool) -> Result<Self> {
        let catalog = Catalog::builtin();
        let mut session = GardenSession::new(
            config.session_settings(),
            catalog.clone(),
            config.local_cache(),
        );

        let worker = match (&config.profile, &config.remote_file) {
            (None, _) => {
                session.adopt(load_layout(None, query::cache(&session)));
                None
            }
            (Some(_), Some(path)) if !offline => {
                Some(attach(&mut session, FileRemote::new(path))?)
            }
            (Some(profile), _) => {
                let remote = MemoryRemote::new();
                remote.set_online(!offline);
                if offline {
                    info!(profile = %profile, "starting offline; remote writes will fail");
                } else {
                    warn!(profile = %profile, "no remote file configured; remote writes stay in memory");
                }
                Some(attach(&mut session, remote)?)
            }
        };

        Ok(Self {
            session,
            worker,
            catalog,
        })
    }

    /// Tile types known to the editor.
    pub(crate) fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Applies one frame of input and refreshes the frame plan.
    ///
    /// The closing frame unmounts the session and waits for queued remote writes.
    pub(crate) fn frame(&mut self, input: FrameInput, frames: &mut RenderLoop) -> Result<()> {
        let mut events = Vec::new();
        for event in &input.events {
            self.session.handle_input(event, &mut events);
        }
        self.session.tick(input.elapsed);
        self.pump(&mut events);
        report(&events);

        if input.closing {
            self.close();
            return Ok(());
        }

        let dirty = self.session.take_dirty() || !events.is_empty();
        let session = &self.session;
        let _ = frames.refresh(dirty, || scene(session), &self.catalog);
        Ok(())
    }

    fn pump(&mut self, events: &mut Vec<Event>) {
        let requests = self.session.drain_remote_requests();
        let Some(worker) = &self.worker else {
            return;
        };
        for request in requests {
            if !worker.submit(request) {
                warn!("remote worker stopped; dropping write");
            }
        }
        for outcome in worker.poll() {
            self.session.complete_remote(&outcome, events);
        }
    }

    fn close(&mut self) {
        let requests = self.session.unmount();
        let Some(worker) = self.worker.take() else {
            return;
        };
        let flushed = requests.len();
        for request in requests {
            let _ = worker.submit(request);
        }
        let mut events = Vec::new();
        for outcome in worker.shutdown() {
            self.session.complete_remote(&outcome, &mut events);
        }
        report(&events);
        info!(flushed, "session closed");
    }
}

/// Loads the stored inventory and layout through `store`, then moves it onto a worker thread.
fn attach<S>(session: &mut GardenSession, mut store: S) -> Result<RemoteWorker>
where
    S: RemoteStore + 'static,
{
    match store.fetch_inventory() {
        Ok(rows) => session.merge_inventory(&rows),
        Err(error) => warn!(%error, "inventory fetch failed; using default stock"),
    }
    let remote: &mut dyn RemoteStore = &mut store;
    let loaded = load_layout(Some(remote), query::cache(session));
    session.adopt(loaded);
    RemoteWorker::spawn(store).context("failed to start the remote worker")
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::SaveSucceeded => info!("layout saved"),
            Event::SaveFailed { reason } => {
                warn!(%reason, "save failed; layout kept in the local cache")
            }
            other => debug!(event = ?other, "session event"),
        }
    }
}

/// Snapshot of everything the frame shows.
pub(crate) fn scene(session: &GardenSession) -> Scene {
    let mut scene = Scene::new(query::camera(session), query::viewport(session));
    scene.tiles = query::tiles_in_paint_order(session)
        .into_iter()
        .map(|tile| SceneTile::new(tile.plant.clone(), tile.cell))
        .collect();
    scene.hovered = query::hovered(session);
    scene.ghost = query::ghost(session).map(|preview| SceneTile::new(preview.plant, preview.cell));
    scene.drag_preview =
        query::drag_preview(session).map(|preview| SceneTile::new(preview.plant, preview.cell));
    scene.removal_prompt = query::removal_prompt(session);
    scene.clear_prompt = query::clear_prompt(session);
    scene.status = Some(status_line(session));
    scene.inventory = Some(inventory(session));
    scene
}

fn inventory(session: &GardenSession) -> Vec<InventorySlot> {
    let selected = query::selected(session);
    let counted = query::profile(session).is_some();
    query::listed(session)
        .into_iter()
        .map(|plant| InventorySlot {
            quantity: counted.then(|| query::quantity(session, &plant)),
            selected: selected.as_ref() == Some(&plant),
            plant,
        })
        .collect()
}

fn status_line(session: &GardenSession) -> String {
    let mut status = match query::selected(session) {
        Some(plant) => {
            let name = query::catalog(session)
                .get(&plant)
                .map_or(plant.as_str(), |tile_type| tile_type.name);
            match query::profile(session) {
                Some(_) => format!("{name} x{}", query::quantity(session, &plant)),
                None => name.to_owned(),
            }
        }
        None => "Nothing left to plant".to_owned(),
    };
    if query::save_in_flight(session) {
        status.push_str(" | saving");
    } else if query::has_unsaved_changes(session) {
        status.push_str(" | unsaved changes");
    }
    status
}
