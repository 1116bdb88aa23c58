use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram,
    WebGlUniformLocation, WebGlVertexArrayObject, Window,
};

use crate::particles::{ParticleField, PARTICLE_COUNT};
use crate::scene::{BloomSettings, CameraRig, Fog, PointMaterial, Viewport};
use crate::wasm::bloom::BloomPass;
use crate::wasm::gl::{link_program, RenderTarget};

const POINTS_VERT: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
uniform mat4 u_model_view;
uniform mat4 u_projection;
uniform float u_size;
uniform float u_scale;
out float v_depth;
void main() {
    vec4 mv = u_model_view * vec4(a_position, 1.0);
    v_depth = -mv.z;
    gl_PointSize = max(u_size * (u_scale / v_depth), 0.0);
    gl_Position = u_projection * mv;
}
"#;

const POINTS_FRAG: &str = r#"#version 300 es
precision mediump float;
uniform vec3 u_color;
uniform float u_opacity;
uniform vec3 u_fog_color;
uniform float u_fog_density;
in float v_depth;
out vec4 out_color;
void main() {
    float r = length(gl_PointCoord - 0.5);
    if (r > 0.5) discard;
    float disc = 1.0 - smoothstep(0.4, 0.5, r);
    float d = u_fog_density * v_depth;
    float fog = clamp(1.0 - exp(-d * d), 0.0, 1.0);
    out_color = vec4(mix(u_color, u_fog_color, fog), u_opacity * disc);
}
"#;

struct PointUniforms {
    model_view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    size: Option<WebGlUniformLocation>,
    scale: Option<WebGlUniformLocation>,
}

/// Scene pass into an offscreen target, then bloom onto the canvas.
struct Backend {
    gl: GL,
    canvas: HtmlCanvasElement,
    program: WebGlProgram,
    uniforms: PointUniforms,
    vao: WebGlVertexArrayObject,
    positions: WebGlBuffer,
    scene_target: RenderTarget,
    bloom: BloomPass,
    camera: CameraRig,
    width: i32,
    height: i32,
}

impl Backend {
    fn new(canvas: HtmlCanvasElement, viewport: Viewport, field: &ParticleField) -> Result<Self, JsValue> {
        let gl: GL = canvas
            .get_context("webgl2")?
            .ok_or("WebGL2 not supported")?
            .dyn_into()?;

        let program = link_program(&gl, POINTS_VERT, POINTS_FRAG)?;
        gl.use_program(Some(&program));

        let material = PointMaterial::default();
        let fog = Fog::default();
        let [r, g, b] = material.color;
        gl.uniform3f(gl.get_uniform_location(&program, "u_color").as_ref(), r, g, b);
        gl.uniform1f(gl.get_uniform_location(&program, "u_opacity").as_ref(), material.opacity);
        let [r, g, b] = fog.color;
        gl.uniform3f(gl.get_uniform_location(&program, "u_fog_color").as_ref(), r, g, b);
        gl.uniform1f(gl.get_uniform_location(&program, "u_fog_density").as_ref(), fog.density);
        let uniforms = PointUniforms {
            model_view: gl.get_uniform_location(&program, "u_model_view"),
            projection: gl.get_uniform_location(&program, "u_projection"),
            size: gl.get_uniform_location(&program, "u_size"),
            scale: gl.get_uniform_location(&program, "u_scale"),
        };
        gl.uniform1f(uniforms.size.as_ref(), material.size);

        let vao = gl.create_vertex_array().ok_or("unable to create vertex array")?;
        gl.bind_vertex_array(Some(&vao));
        let positions = gl.create_buffer().ok_or("unable to create buffer")?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&positions));
        let initial = js_sys::Float32Array::from(field.positions());
        gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &initial, GL::DYNAMIC_DRAW);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_with_i32(0, 3, GL::FLOAT, false, 0, 0);
        gl.bind_vertex_array(None);

        let (w, h) = viewport.physical_size();
        let (w, h) = (w as i32, h as i32);
        let mut backend = Self {
            scene_target: RenderTarget::new(&gl, w, h)?,
            bloom: BloomPass::new(&gl, BloomSettings::default(), w, h)?,
            camera: CameraRig::new(viewport.aspect()),
            gl,
            canvas,
            program,
            uniforms,
            vao,
            positions,
            width: w,
            height: h,
        };
        backend.resize(viewport)?;
        Ok(backend)
    }

    /// Camera aspect, canvas buffer and every render target follow the window.
    fn resize(&mut self, viewport: Viewport) -> Result<(), JsValue> {
        let (w, h) = viewport.physical_size();
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", viewport.css_width))?;
        style.set_property("height", &format!("{}px", viewport.css_height))?;

        self.width = w as i32;
        self.height = h as i32;
        self.camera.set_aspect(viewport.aspect());
        self.scene_target.resize(&self.gl, self.width, self.height)?;
        self.bloom.set_size(&self.gl, self.width, self.height)?;
        log::debug!("viewport {}x{} @{}", viewport.css_width, viewport.css_height, viewport.pixel_ratio);
        Ok(())
    }

    fn draw(&self, field: &ParticleField) {
        let gl = &self.gl;

        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&self.positions));
        let data = js_sys::Float32Array::from(field.positions());
        gl.buffer_sub_data_with_i32_and_array_buffer_view(GL::ARRAY_BUFFER, 0, &data);

        self.scene_target.bind(gl);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(GL::COLOR_BUFFER_BIT);
        gl.disable(GL::DEPTH_TEST);
        gl.enable(GL::BLEND);
        gl.blend_func(GL::SRC_ALPHA, GL::ONE);

        gl.use_program(Some(&self.program));
        let model_view = self.camera.model_view(field.rotation_y()).to_cols_array();
        let projection = self.camera.projection().to_cols_array();
        gl.uniform_matrix4fv_with_f32_array(self.uniforms.model_view.as_ref(), false, &model_view);
        gl.uniform_matrix4fv_with_f32_array(self.uniforms.projection.as_ref(), false, &projection);
        gl.uniform1f(self.uniforms.scale.as_ref(), self.camera.point_scale(self.height as u32));

        gl.bind_vertex_array(Some(&self.vao));
        gl.draw_arrays(GL::POINTS, 0, field.len() as i32);
        gl.bind_vertex_array(None);

        self.bloom.render(gl, &self.scene_target, self.width, self.height);
    }
}

fn current_viewport(window: &Window) -> Viewport {
    let css = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
    Viewport::new(
        css(window.inner_width()),
        css(window.inner_height()),
        window.device_pixel_ratio(),
    )
}

/// Start the particle background: builds the field and backend, follows
/// window resizes and advances one step per animation frame for the life of
/// the page.
pub fn start(canvas: HtmlCanvasElement) -> Result<(), JsValue> {
    let win = window().ok_or("no window")?;
    let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
    let field = ParticleField::new(PARTICLE_COUNT, &mut SmallRng::seed_from_u64(seed));
    let backend = Backend::new(canvas, current_viewport(&win), &field)?;

    let field = Rc::new(RefCell::new(field));
    let backend = Rc::new(RefCell::new(backend));

    // Resize canvas to fit window
    let resize_closure = {
        let backend = backend.clone();
        let win = win.clone();
        Closure::<dyn FnMut()>::new(move || {
            if let Err(e) = backend.borrow_mut().resize(current_viewport(&win)) {
                log::error!("resize failed: {e:?}");
            }
        })
    };
    win.add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref())?;
    resize_closure.forget();

    // Animation loop
    // `f` holds the animation-frame closure so that we can keep calling
    // `request_animation_frame` recursively. Storing it inside an `Option`
    // allows us to create the `Closure` first and then obtain a reference to
    // it from within itself.
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let frame_win = win.clone();
    *g.borrow_mut() = Some(Closure::<dyn FnMut()>::new(move || {
        field.borrow_mut().step();
        backend.borrow().draw(&field.borrow());

        // schedule next
        if let Some(next) = f.borrow().as_ref() {
            if let Err(e) = frame_win.request_animation_frame(next.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame failed: {e:?}");
            }
        }
    }));

    if let Some(first) = g.borrow().as_ref() {
        win.request_animation_frame(first.as_ref().unchecked_ref())?;
    }
    log::info!("particle field running with {PARTICLE_COUNT} points");
    Ok(())
}
