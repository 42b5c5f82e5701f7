use std::cell::RefCell;

use engine::{Engine, EngineConfig};
use foundation::time::Time;
use protocol::WorkerMessage;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{DedicatedWorkerGlobalScope, MessageEvent};

use crate::inbound;
use crate::state::WorkerState;

thread_local! {
    static STATE: RefCell<WorkerState> =
        RefCell::new(WorkerState::new(Engine::seeded(EngineConfig::default(), seed())));
    static FRAME_CALLBACK: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
}

fn seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

fn scope() -> Result<DedicatedWorkerGlobalScope, JsValue> {
    js_sys::global()
        .dyn_into::<DedicatedWorkerGlobalScope>()
        .map_err(JsValue::from)
}

pub fn install() -> Result<(), JsValue> {
    let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(on_message);
    scope()?.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();
    Ok(())
}

fn on_message(event: MessageEvent) {
    let inbound = match inbound::decode(&event.data()) {
        Ok(inbound) => inbound,
        Err(err) => {
            tracing::warn!(%err, "ignoring message");
            return;
        }
    };

    let effects = STATE.with(|state| {
        state
            .borrow_mut()
            .handle(inbound.command, inbound.canvas)
    });

    for message in &effects.outbound {
        if let Err(err) = post(message) {
            tracing::warn!(?err, "failed to post message");
        }
    }
    if effects.init_gpu {
        spawn_local(init_gpu());
    }
    if effects.schedule_frame {
        request_frame();
    }
}

fn post(message: &WorkerMessage) -> Result<(), JsValue> {
    let json = message
        .encode()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    scope()?.post_message(&js_sys::JSON::parse(&json)?)
}

fn request_frame() {
    let result = FRAME_CALLBACK.with(|slot| -> Result<(), JsValue> {
        let mut slot = slot.borrow_mut();
        let callback = slot.get_or_insert_with(|| Closure::<dyn FnMut(f64)>::new(on_frame));
        scope()?.request_animation_frame(callback.as_ref().unchecked_ref())?;
        Ok(())
    });
    if let Err(err) = result {
        tracing::error!(?err, "requestAnimationFrame failed");
        STATE.with(|state| state.borrow_mut().frame_dropped());
    }
}

fn on_frame(timestamp_ms: f64) {
    let again = STATE.with(|state| state.borrow_mut().frame(Time::from_millis(timestamp_ms)));
    if again {
        request_frame();
    }
}

#[cfg(target_arch = "wasm32")]
async fn init_gpu() {
    let Some(target) = STATE.with(|state| state.borrow().render_target()) else {
        return;
    };
    let ctx = match gpu::GpuContext::new(
        ::wgpu::SurfaceTarget::OffscreenCanvas(target.canvas),
        target.width,
        target.height,
    )
    .await
    {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::error!(%err, "gpu unavailable, rendering disabled");
            return;
        }
    };
    let renderer = gpu::FlowRenderer::new(ctx, gpu::RenderConstants::default()).await;
    STATE.with(|state| {
        state
            .borrow_mut()
            .attach_renderer(renderer, target.generation)
    });
}

#[cfg(not(target_arch = "wasm32"))]
async fn init_gpu() {
    tracing::error!("gpu rendering is only available on wasm32 targets");
}
