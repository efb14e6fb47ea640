//! Staged editor bring-up.
//!
//! Startup runs named stages strictly in dependency order: the selection
//! engine is constructed first, the transform tool is bound to it next,
//! then UI listeners, and finally the optional content library is loaded.
//! Each stage's products are published to the dependency registry before
//! the next stage starts waiting, so later stages observe earlier ones'
//! side effects. A required stage's failure halts the sequence; the
//! optional library stage degrades to an empty library with a warning.

use std::sync::Arc;
use std::time::Duration;

use decal_core::{
    OrbitControl, OverlayHost, RayCaster, SceneGraph, SelectionEngine, SelectionObserver,
    TransformTool,
};
use decal_renderer::RasterImage;
use tokio::sync::Mutex;

use crate::init::{InitError, InitResult, Initializer};

/// Dependency names used by the startup sequence.
pub mod names {
    /// The external scene graph.
    pub const SCENE: &str = "scene-graph";
    /// The external ray-intersection primitive.
    pub const RAYCASTER: &str = "raycaster";
    /// The selection-overlay host.
    pub const OVERLAYS: &str = "overlay-host";
    /// The camera-orbit control.
    pub const ORBIT: &str = "orbit-control";
    /// The external transform tool.
    pub const TRANSFORM_TOOL: &str = "transform-tool";
    /// Selection listeners registered by UI panels.
    pub const UI_LISTENERS: &str = "ui-listeners";
    /// Default content delivered by the library loader.
    pub const CONTENT_LIBRARY: &str = "content-library";
    /// Published by startup once the selection engine is constructed.
    pub const SELECTION_ENGINE: &str = "selection-engine";
}

/// Published handle to the external scene graph.
pub struct SceneDep(
    /// Shared scene-graph collaborator.
    pub Arc<dyn SceneGraph>,
);

/// Published handle to the external ray caster.
pub struct RayCasterDep(
    /// Shared ray-casting collaborator.
    pub Arc<dyn RayCaster>,
);

/// Published handle to the selection-overlay host.
pub struct OverlayDep(
    /// Shared overlay-host collaborator.
    pub Arc<dyn OverlayHost>,
);

/// Published handle to the camera-orbit control.
pub struct OrbitDep(
    /// Shared orbit-control collaborator.
    pub Arc<dyn OrbitControl>,
);

/// Published handle to the external transform tool.
pub struct TransformToolDep(
    /// Shared transform-tool collaborator.
    pub Arc<dyn TransformTool>,
);

/// Selection listener published by the UI collaborator.
pub struct UiListenersDep(
    /// Listener notified on every selection change.
    pub Arc<dyn SelectionObserver>,
);

/// Default content published by the library loader.
pub struct ContentLibraryDep {
    /// Named rasters available as default content.
    pub items: Vec<(String, Arc<RasterImage>)>,
}

/// Shared handle to the constructed selection engine, published under
/// [`names::SELECTION_ENGINE`].
pub struct SelectionEngineDep(
    /// The engine, shared behind an async mutex.
    pub Arc<Mutex<SelectionEngine>>,
);

/// Timeouts for the startup stages.
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Timeout for each required stage's dependencies.
    pub stage_timeout: Duration,
    /// Timeout for the optional content-library stage.
    pub library_timeout: Duration,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(5),
            library_timeout: Duration::from_secs(2),
        }
    }
}

/// Handles produced by a successful startup.
pub struct EditorHandles {
    /// The selection engine, bound to the transform tool and UI.
    pub selection: Arc<Mutex<SelectionEngine>>,
    /// Default content, if the optional library stage succeeded.
    pub library: Option<Arc<ContentLibraryDep>>,
}

/// Adapts a shared observer to the engine's boxed subscription.
struct SharedObserver(Arc<dyn SelectionObserver>);

impl SelectionObserver for SharedObserver {
    fn selection_changed(&self, change: &decal_core::SelectionChange) {
        self.0.selection_changed(change);
    }
}

/// Run the startup stages in dependency order.
///
/// # Errors
///
/// Returns [`InitError::Stage`] when a required stage's dependencies time
/// out; the optional content-library stage never fails the sequence.
pub async fn initialize(init: &Initializer, config: &StartupConfig) -> InitResult<EditorHandles> {
    // Stage 1: construct the selection engine from the renderer
    // collaborators.
    init.wait_for_all(
        &[names::SCENE, names::RAYCASTER, names::OVERLAYS, names::ORBIT],
        config.stage_timeout,
    )
    .await
    .map_err(|err| stage_failure("selection-engine", err))?;

    let scene = init
        .wait_for::<SceneDep>(names::SCENE, config.stage_timeout)
        .await
        .map_err(|err| stage_failure("selection-engine", err))?;
    let raycaster = init
        .wait_for::<RayCasterDep>(names::RAYCASTER, config.stage_timeout)
        .await
        .map_err(|err| stage_failure("selection-engine", err))?;
    let overlays = init
        .wait_for::<OverlayDep>(names::OVERLAYS, config.stage_timeout)
        .await
        .map_err(|err| stage_failure("selection-engine", err))?;
    let orbit = init
        .wait_for::<OrbitDep>(names::ORBIT, config.stage_timeout)
        .await
        .map_err(|err| stage_failure("selection-engine", err))?;

    let mut engine = SelectionEngine::new(
        scene.0.clone(),
        raycaster.0.clone(),
        overlays.0.clone(),
        orbit.0.clone(),
    );
    engine.refresh_selectable_objects();
    let selection = Arc::new(Mutex::new(engine));
    init.registry().publish(
        names::SELECTION_ENGINE,
        Arc::new(SelectionEngineDep(selection.clone())),
    );
    tracing::info!("selection engine constructed");

    // Stage 2: bind the transform tool to the engine.
    let tool = init
        .wait_for::<TransformToolDep>(names::TRANSFORM_TOOL, config.stage_timeout)
        .await
        .map_err(|err| stage_failure("transform-tool-binding", err))?;
    selection.lock().await.bind_transform_tool(tool.0.clone());
    tracing::info!("transform tool bound");

    // Stage 3: wire UI listeners into the engine.
    let ui = init
        .wait_for::<UiListenersDep>(names::UI_LISTENERS, config.stage_timeout)
        .await
        .map_err(|err| stage_failure("ui-listener-binding", err))?;
    selection
        .lock()
        .await
        .subscribe(Box::new(SharedObserver(ui.0.clone())));
    tracing::info!("ui listeners bound");

    // Stage 4 (optional): default content. A missing library degrades the
    // editor, it does not block it.
    let library = match init
        .wait_for::<ContentLibraryDep>(names::CONTENT_LIBRARY, config.library_timeout)
        .await
    {
        Ok(library) => {
            tracing::info!(items = library.items.len(), "content library loaded");
            Some(library)
        }
        Err(err) => {
            tracing::warn!(%err, "content library unavailable, continuing without default content");
            None
        }
    };

    Ok(EditorHandles { selection, library })
}

fn stage_failure(stage: &str, err: InitError) -> InitError {
    tracing::error!(stage, %err, "required startup stage failed");
    InitError::Stage {
        stage: stage.to_string(),
        source: anyhow::Error::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::{DependencyRegistry, FrameClock};
    use decal_core::{ObjectId, OverlayId, RayHit, SceneNodeDesc, SelectionChange, Vec3};

    struct EmptyScene;

    impl SceneGraph for EmptyScene {
        fn children(&self) -> Vec<SceneNodeDesc> {
            Vec::new()
        }

        fn parent(&self, _id: ObjectId) -> Option<ObjectId> {
            None
        }

        fn contains(&self, _id: ObjectId) -> bool {
            false
        }

        fn remove(&self, _id: ObjectId) -> bool {
            false
        }

        fn name(&self, _id: ObjectId) -> Option<String> {
            None
        }
    }

    struct NoopRayCaster;

    impl RayCaster for NoopRayCaster {
        fn cast(&self, _origin: Vec3, _direction: Vec3, _candidates: &[ObjectId]) -> Vec<RayHit> {
            Vec::new()
        }
    }

    struct NoopOverlays;

    impl OverlayHost for NoopOverlays {
        fn add_overlay(&self, _target: ObjectId) -> OverlayId {
            OverlayId::new()
        }

        fn remove_overlay(&self, _id: OverlayId) {}
    }

    struct NoopOrbit;

    impl OrbitControl for NoopOrbit {
        fn set_enabled(&self, _enabled: bool) {}
    }

    struct NoopTool;

    impl TransformTool for NoopTool {
        fn attach(&self, _target: ObjectId) {}

        fn detach(&self) {}

        fn is_dragging(&self) -> bool {
            false
        }

        fn gizmo_objects(&self) -> Vec<ObjectId> {
            Vec::new()
        }
    }

    struct NoopListener;

    impl SelectionObserver for NoopListener {
        fn selection_changed(&self, _change: &SelectionChange) {}
    }

    fn publish_renderer_deps(registry: &DependencyRegistry) {
        registry.publish(names::SCENE, Arc::new(SceneDep(Arc::new(EmptyScene))));
        registry.publish(
            names::RAYCASTER,
            Arc::new(RayCasterDep(Arc::new(NoopRayCaster))),
        );
        registry.publish(names::OVERLAYS, Arc::new(OverlayDep(Arc::new(NoopOverlays))));
        registry.publish(names::ORBIT, Arc::new(OrbitDep(Arc::new(NoopOrbit))));
    }

    fn publish_tool_and_ui(registry: &DependencyRegistry) {
        registry.publish(
            names::TRANSFORM_TOOL,
            Arc::new(TransformToolDep(Arc::new(NoopTool))),
        );
        registry.publish(
            names::UI_LISTENERS,
            Arc::new(UiListenersDep(Arc::new(NoopListener))),
        );
    }

    fn config() -> StartupConfig {
        StartupConfig {
            stage_timeout: Duration::from_millis(200),
            library_timeout: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_runs_stages_in_order() {
        let registry = DependencyRegistry::new();
        let clock = FrameClock::new();
        let init = Initializer::new(registry.clone(), clock.clone());
        let _driver = clock.spawn_driver(Duration::from_millis(16));

        publish_renderer_deps(&registry);
        publish_tool_and_ui(&registry);
        registry.publish(
            names::CONTENT_LIBRARY,
            Arc::new(ContentLibraryDep {
                items: vec![(
                    "placeholder".to_string(),
                    Arc::new(RasterImage::checkerboard(32, 32)),
                )],
            }),
        );

        let handles = initialize(&init, &config()).await.expect("startup succeeds");
        assert!(handles.library.is_some());
        assert!(registry.contains(names::SELECTION_ENGINE));
        // The engine is live and usable through the published handle.
        handles.selection.lock().await.refresh_selectable_objects();
    }

    #[tokio::test(start_paused = true)]
    async fn test_required_stage_timeout_halts_startup() {
        let registry = DependencyRegistry::new();
        let clock = FrameClock::new();
        let init = Initializer::new(registry.clone(), clock.clone());
        let _driver = clock.spawn_driver(Duration::from_millis(16));

        publish_renderer_deps(&registry);
        // No transform tool: stage 2 must fail and stage 3 never runs.

        let result = initialize(&init, &config()).await;
        assert!(matches!(
            result,
            Err(InitError::Stage { ref stage, .. }) if stage == "transform-tool-binding"
        ));
        // Stage 1's product stays published for inspection.
        assert!(registry.contains(names::SELECTION_ENGINE));
        assert!(!registry.contains(names::UI_LISTENERS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_optional_library_failure_degrades_gracefully() {
        let registry = DependencyRegistry::new();
        let clock = FrameClock::new();
        let init = Initializer::new(registry.clone(), clock.clone());
        let _driver = clock.spawn_driver(Duration::from_millis(16));

        publish_renderer_deps(&registry);
        publish_tool_and_ui(&registry);
        // No content library published.

        let handles = initialize(&init, &config()).await.expect("startup succeeds");
        assert!(handles.library.is_none());
    }
}
