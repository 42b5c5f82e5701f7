//! WGSL sources. Both pipelines share the `Globals` block and helpers.

pub const GLOBALS: &str = r#"
struct Globals {
    center: vec2<f32>,
    viewport: vec2<f32>,
    scale: f32,
    zoom: f32,
    time: f32,
    opacity: f32,
    path_width: f32,
    speed: f32,
    size: f32,
    traffic_filter: u32,
    scale_by_zoom: u32,
    lane_spread: f32,
    particle_size: f32,
    line_alpha: f32,
    general_color: vec4<f32>,
    hidden_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

const PI: f32 = 3.14159265;

// Tile space to clip space; screen y grows downwards.
fn to_clip(tile: vec2<f32>) -> vec2<f32> {
    let px = (tile - globals.center) * globals.scale + globals.viewport * 0.5;
    return vec2<f32>(px.x / globals.viewport.x * 2.0 - 1.0, 1.0 - px.y / globals.viewport.y * 2.0);
}

// Sideways displacement of a lane at progress t. Zero at both endpoints.
fn bow(start: vec2<f32>, end: vec2<f32>, lane: f32, t: f32) -> vec2<f32> {
    let d = end - start;
    let dist = length(d);
    if (dist <= 0.0) {
        return vec2<f32>(0.0, 0.0);
    }
    let normal = vec2<f32>(-d.y, d.x) / dist;
    return normal * lane * globals.path_width * globals.lane_spread * dist * sin(PI * t);
}

// 0 = all, 1 = hidden only, 2 = general only.
fn traffic_visible(traffic: f32) -> f32 {
    let hidden = traffic > 0.5;
    if (globals.traffic_filter == 1u && !hidden) {
        return 0.0;
    }
    if (globals.traffic_filter == 2u && hidden) {
        return 0.0;
    }
    return 1.0;
}

fn traffic_color(traffic: f32) -> vec4<f32> {
    return select(globals.general_color, globals.hidden_color, traffic > 0.5);
}

fn premultiply(color: vec4<f32>, alpha: f32) -> vec4<f32> {
    let a = color.a * alpha;
    return vec4<f32>(color.rgb * a, a);
}
"#;

const LINES_BODY: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(
    @location(0) start: vec2<f32>,
    @location(1) end: vec2<f32>,
    @location(2) segment: vec2<f32>,
    @location(3) side: f32,
    @location(4) lane: f32,
    @location(5) traffic: f32,
) -> VsOut {
    let t = mix(segment.x, segment.y, side);
    let p = mix(start, end, t) + bow(start, end, lane, t);
    let alpha = globals.line_alpha * globals.opacity * traffic_visible(traffic);
    return VsOut(vec4<f32>(to_clip(p), 0.0, 1.0), premultiply(traffic_color(traffic), alpha));
}

@fragment
fn fs_main(v: VsOut) -> @location(0) vec4<f32> {
    return v.color;
}
"#;

const PARTICLES_BODY: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) uv: vec2<f32>,
};

fn corner(i: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    return corners[i];
}

@vertex
fn vs_main(
    @builtin(vertex_index) vid: u32,
    @location(0) start: vec2<f32>,
    @location(1) end: vec2<f32>,
    @location(2) speed: f32,
    @location(3) phase: f32,
    @location(4) traffic: f32,
    @location(5) rank: f32,
    @location(6) lane: f32,
) -> VsOut {
    // Constant on-screen speed: progress per second is pixels per second
    // over the route's on-screen length. Top-ranked routes run faster.
    let length_px = max(length(end - start) * globals.scale, 1.0);
    let rank_speed = mix(1.5, 0.6, rank);
    let progress = fract(phase + globals.time * speed * globals.speed * rank_speed / length_px);
    let center = mix(start, end, progress) + bow(start, end, lane, progress);

    var zoom_factor = 1.0;
    if (globals.scale_by_zoom != 0u) {
        zoom_factor = clamp(1.0 + (globals.zoom - 2.0) * 0.25, 0.5, 3.0);
    }
    let size_px = globals.particle_size * globals.size * mix(1.6, 0.8, rank) * zoom_factor;

    let c = corner(vid % 6u);
    let clip = to_clip(center) + c * size_px / globals.viewport;
    let alpha = globals.opacity * traffic_visible(traffic);
    return VsOut(vec4<f32>(clip, 0.0, 1.0), premultiply(traffic_color(traffic), alpha), c);
}

@fragment
fn fs_main(v: VsOut) -> @location(0) vec4<f32> {
    let r = length(v.uv);
    if (r > 1.0) {
        discard;
    }
    return v.color * (1.0 - smoothstep(0.5, 1.0, r));
}
"#;

pub fn lines_source() -> String {
    format!("{GLOBALS}{LINES_BODY}")
}

pub fn particles_source() -> String {
    format!("{GLOBALS}{PARTICLES_BODY}")
}
