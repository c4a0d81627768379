//! The stamp being designed: state, route and map kept in step, saved after
//! every change.

use tracing::{debug, error, info};

use super::map::{MapPresenter, MapSurface};
use crate::app::domain::app_state::{AppState, UNTITLED};
use crate::app::domain::color::LineColor;
use crate::app::domain::destination::Destination;
use crate::app::domain::route::Route;
use crate::app::domain::template::{Template, TemplateCatalog};
use crate::app::infrastructure::error::Result;
use crate::app::infrastructure::token::{InOrder, Ticket};
use crate::app::services::export::ensure_exportable;
use crate::app::services::geocoder::GeocodeOutcome;
use crate::app::services::payment::CheckoutPayload;
use crate::app::services::persistence::StateStore;

/// A geocoding request handed out to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub ticket: Ticket,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodeApplied {
    Added,
    NotFound,
}

/// A lookup whose result has reached the route, in the order it was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledLookup {
    pub name: String,
    pub applied: GeocodeApplied,
}

pub struct StampSession<S: MapSurface> {
    state: AppState,
    route: Route,
    presenter: MapPresenter<S>,
    store: StateStore,
    lookups: InOrder<(String, GeocodeOutcome)>,
}

impl<S: MapSurface> StampSession<S> {
    /// Restore the saved stamp and start loading the map.
    pub fn new(surface: S, store: StateStore) -> Self {
        let state = store.load();
        let route = Route::from_destinations(state.destinations.clone());
        let mut presenter = MapPresenter::new(surface, &state.map_style_id, state.line_color);
        presenter.render(&route);
        presenter.init();
        info!(destinations = route.len(), template = %state.template_id, "session restored");
        Self {
            state,
            route,
            presenter,
            store,
            lookups: InOrder::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn presenter(&self) -> &MapPresenter<S> {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut MapPresenter<S> {
        &mut self.presenter
    }

    pub fn template(&self) -> &'static Template {
        TemplateCatalog::resolve(&self.state.template_id)
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            error!(path = %self.store.path().display(), "Failed to save state: {}", e);
        }
    }

    fn sync_route(&mut self) {
        self.state.destinations = self.route.destinations().to_vec();
        self.presenter.render(&self.route);
        self.persist();
    }

    /// Start a lookup for `name`. Blank names start nothing.
    pub fn begin_geocode(&mut self, name: &str) -> Option<LookupTicket> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let ticket = self.lookups.issue();
        debug!(name, ticket = ticket.value(), "geocode started");
        Some(LookupTicket {
            ticket,
            name: name.to_string(),
        })
    }

    /// Record a finished lookup and apply every result now in order.
    ///
    /// A result that beats an earlier lookup is held until that one lands,
    /// so the route keeps the order places were entered. Results for
    /// cancelled lookups are dropped and nothing settles.
    pub fn finish_geocode(
        &mut self,
        ticket: Ticket,
        name: &str,
        outcome: GeocodeOutcome,
    ) -> Vec<SettledLookup> {
        let Some(ready) = self
            .lookups
            .complete(ticket, (name.to_string(), outcome))
        else {
            debug!(name, ticket = ticket.value(), "dropping cancelled geocode result");
            return Vec::new();
        };
        if ready.is_empty() {
            debug!(name, ticket = ticket.value(), "holding geocode result for earlier lookups");
            return Vec::new();
        }

        let mut settled = Vec::with_capacity(ready.len());
        let mut added = false;
        for (name, outcome) in ready {
            let applied = match outcome {
                GeocodeOutcome::Found(coordinates) => {
                    self.route.push(Destination::new(&name, coordinates));
                    added = true;
                    GeocodeApplied::Added
                }
                GeocodeOutcome::NotFound | GeocodeOutcome::Failed(_) => GeocodeApplied::NotFound,
            };
            settled.push(SettledLookup { name, applied });
        }
        if added {
            self.sync_route();
        }
        settled
    }

    /// Removing a stop cancels lookups still in flight.
    pub fn remove_destination(&mut self, index: usize) -> bool {
        if !self.route.remove_destination(index) {
            return false;
        }
        let cancelled = self.lookups.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "route changed; pending lookups cancelled");
        }
        self.sync_route();
        true
    }

    /// A blank title becomes "Mi viaje".
    pub fn set_title(&mut self, title: &str) {
        self.state.title = if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            title.to_string()
        };
        self.persist();
    }

    pub fn set_map_style(&mut self, style_id: &str) {
        self.state.map_style_id = style_id.to_string();
        self.presenter.set_style(style_id);
        self.persist();
    }

    pub fn set_line_color(&mut self, color: LineColor) {
        self.state.line_color = color;
        self.presenter.set_line_color(color);
        self.persist();
    }

    /// Unknown template ids are refused.
    pub fn set_template(&mut self, template_id: &str) -> bool {
        if TemplateCatalog::get(template_id).is_none() {
            return false;
        }
        self.state.template_id = template_id.to_string();
        self.persist();
        true
    }

    pub fn on_style_loaded(&mut self, ticket: Ticket) -> bool {
        self.presenter.on_style_loaded(ticket)
    }

    pub fn checkout_payload(&self) -> CheckoutPayload {
        CheckoutPayload {
            title: self.state.title.clone(),
            destinations: self.route.names().join(","),
            template_style: self.state.template_id.clone(),
        }
    }

    pub fn ensure_exportable(&self) -> Result<()> {
        ensure_exportable(&self.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::controllers::map::{CircleLayer, LineLayer, Marker, MapPhase, Paint};
    use crate::app::domain::destination::Coordinates;
    use crate::app::domain::geo::Bounds;
    use crate::app::infrastructure::error::AppError;

    /// Accepts everything and remembers the last style ticket.
    #[derive(Default)]
    struct NullSurface {
        ticket: Option<Ticket>,
        routes_drawn: usize,
    }

    impl MapSurface for NullSurface {
        fn set_style(&mut self, _style_id: &str, ticket: Ticket) -> Result<()> {
            self.ticket = Some(ticket);
            Ok(())
        }
        fn is_style_loaded(&self) -> bool {
            true
        }
        fn has_layer(&self, _id: &str) -> bool {
            false
        }
        fn add_line_layer(&mut self, _layer: LineLayer) -> Result<()> {
            Ok(())
        }
        fn add_circle_layer(&mut self, _layer: CircleLayer) -> Result<()> {
            Ok(())
        }
        fn set_paint(&mut self, _layer: &str, _paint: Paint) -> Result<()> {
            Ok(())
        }
        fn set_route_data(&mut self, _path: &[Coordinates]) -> Result<()> {
            self.routes_drawn += 1;
            Ok(())
        }
        fn render_markers(&mut self, _markers: &[Marker]) -> Result<()> {
            Ok(())
        }
        fn fit_bounds(&mut self, _bounds: Bounds, _padding: u32, _duration_ms: u32) -> Result<()> {
            Ok(())
        }
        fn fly_to(&mut self, _center: Coordinates, _zoom: f64, _duration_ms: u32) -> Result<()> {
            Ok(())
        }
    }

    fn session_in(dir: &tempfile::TempDir) -> StampSession<NullSurface> {
        StampSession::new(NullSurface::default(), StateStore::new(dir.path().join("state.json")))
    }

    const SANTIAGO: Coordinates = Coordinates::new(-70.6693, -33.4489);
    const VALPARAISO: Coordinates = Coordinates::new(-71.6127, -33.0472);

    fn add(session: &mut StampSession<NullSurface>, name: &str, at: Coordinates) {
        let lookup = session.begin_geocode(name).unwrap();
        let settled =
            session.finish_geocode(lookup.ticket, &lookup.name, GeocodeOutcome::Found(at));
        assert_eq!(settled, vec![settled_as(&lookup.name, GeocodeApplied::Added)]);
    }

    fn settled_as(name: &str, applied: GeocodeApplied) -> SettledLookup {
        SettledLookup {
            name: name.to_string(),
            applied,
        }
    }

    #[test]
    fn test_adds_build_display_string() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        add(&mut session, "  Santiago ", SANTIAGO);
        add(&mut session, "Valparaíso", VALPARAISO);
        assert_eq!(session.route().display_string(), "Santiago → Valparaíso");
        assert_eq!(session.state().destinations.len(), 2);
    }

    #[test]
    fn test_blank_name_starts_no_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        assert!(session.begin_geocode("   ").is_none());
    }

    #[test]
    fn test_overlapping_lookups_keep_entry_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let first = session.begin_geocode("Santiago").unwrap();
        let second = session.begin_geocode("Valparaíso").unwrap();

        let settled =
            session.finish_geocode(first.ticket, &first.name, GeocodeOutcome::Found(SANTIAGO));
        assert_eq!(settled, vec![settled_as("Santiago", GeocodeApplied::Added)]);
        let settled =
            session.finish_geocode(second.ticket, &second.name, GeocodeOutcome::Found(VALPARAISO));
        assert_eq!(settled, vec![settled_as("Valparaíso", GeocodeApplied::Added)]);

        assert_eq!(session.route().display_string(), "Santiago → Valparaíso");
    }

    #[test]
    fn test_early_result_waits_for_earlier_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let first = session.begin_geocode("Santiago").unwrap();
        let second = session.begin_geocode("Atlantis").unwrap();
        let third = session.begin_geocode("Valparaíso").unwrap();

        let held =
            session.finish_geocode(third.ticket, &third.name, GeocodeOutcome::Found(VALPARAISO));
        assert!(held.is_empty());
        let held = session.finish_geocode(second.ticket, &second.name, GeocodeOutcome::NotFound);
        assert!(held.is_empty());
        assert!(session.route().is_empty());

        let settled =
            session.finish_geocode(first.ticket, &first.name, GeocodeOutcome::Found(SANTIAGO));
        assert_eq!(
            settled,
            vec![
                settled_as("Santiago", GeocodeApplied::Added),
                settled_as("Atlantis", GeocodeApplied::NotFound),
                settled_as("Valparaíso", GeocodeApplied::Added),
            ]
        );
        assert_eq!(session.route().display_string(), "Santiago → Valparaíso");
        assert_eq!(session.state().destinations.len(), 2);
    }

    #[test]
    fn test_route_change_cancels_pending_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        add(&mut session, "Santiago", SANTIAGO);
        let pending = session.begin_geocode("Valparaíso").unwrap();
        assert!(session.remove_destination(0));

        let dropped =
            session.finish_geocode(pending.ticket, &pending.name, GeocodeOutcome::Found(VALPARAISO));
        assert!(dropped.is_empty());
        assert!(session.route().is_empty());

        add(&mut session, "Valparaíso", VALPARAISO);
        assert_eq!(session.route().display_string(), "Valparaíso");
    }

    #[test]
    fn test_failed_lookup_leaves_route_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let lookup = session.begin_geocode("Atlantis").unwrap();
        assert_eq!(
            session.finish_geocode(lookup.ticket, &lookup.name, GeocodeOutcome::NotFound),
            vec![settled_as("Atlantis", GeocodeApplied::NotFound)]
        );
        let lookup = session.begin_geocode("Lima").unwrap();
        assert_eq!(
            session.finish_geocode(
                lookup.ticket,
                &lookup.name,
                GeocodeOutcome::Failed("timeout".to_string())
            ),
            vec![settled_as("Lima", GeocodeApplied::NotFound)]
        );
        assert!(session.route().is_empty());
    }

    #[test]
    fn test_remove_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        add(&mut session, "Santiago", SANTIAGO);
        assert!(!session.remove_destination(1));
        assert_eq!(session.route().len(), 1);
        assert!(session.remove_destination(0));
        assert!(session.route().is_empty());
    }

    #[test]
    fn test_changes_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = session_in(&dir);
            add(&mut session, "Santiago", SANTIAGO);
            add(&mut session, "Valparaíso", VALPARAISO);
            session.set_title("Costa central");
            session.set_template("story");
            session.set_line_color(LineColor::rgb(0xDC, 0x26, 0x26));
            session.set_map_style("mapbox://styles/mapbox/dark-v11");
        }
        let session = session_in(&dir);
        let state = session.state();
        assert_eq!(state.title, "Costa central");
        assert_eq!(state.template_id, "story");
        assert_eq!(state.line_color, LineColor::rgb(0xDC, 0x26, 0x26));
        assert_eq!(state.map_style_id, "mapbox://styles/mapbox/dark-v11");
        assert_eq!(session.route().display_string(), "Santiago → Valparaíso");
        assert_eq!(session.presenter().style_id(), "mapbox://styles/mapbox/dark-v11");
    }

    #[test]
    fn test_blank_title_becomes_untitled() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.set_title("");
        assert_eq!(session.state().title, "Mi viaje");
    }

    #[test]
    fn test_unknown_template_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        assert!(!session.set_template("poster"));
        assert_eq!(session.state().template_id, "classic");
        assert_eq!(session.template().id, "classic");
    }

    #[test]
    fn test_checkout_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        add(&mut session, "Santiago", SANTIAGO);
        add(&mut session, "Valparaíso", VALPARAISO);
        session.set_template("wide");
        let payload = session.checkout_payload();
        assert_eq!(payload.title, "Mi viaje por Chile");
        assert_eq!(payload.destinations, "Santiago,Valparaíso");
        assert_eq!(payload.template_style, "wide");
    }

    #[test]
    fn test_export_needs_two_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        add(&mut session, "Santiago", SANTIAGO);
        assert!(matches!(
            session.ensure_exportable(),
            Err(AppError::NotEnoughDestinations(1))
        ));
        add(&mut session, "Valparaíso", VALPARAISO);
        assert!(session.ensure_exportable().is_ok());
    }

    #[test]
    fn test_restored_route_drawn_once_map_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = session_in(&dir);
            add(&mut session, "Santiago", SANTIAGO);
        }
        let mut session = session_in(&dir);
        assert_eq!(session.presenter().phase(), MapPhase::Loading);
        assert_eq!(session.presenter().surface().routes_drawn, 0);

        let ticket = session.presenter().surface().ticket.unwrap();
        assert!(session.on_style_loaded(ticket));
        assert_eq!(session.presenter().surface().routes_drawn, 1);
    }
}
