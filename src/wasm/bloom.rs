use wasm_bindgen::JsValue;
use web_sys::{
    WebGl2RenderingContext as GL, WebGlProgram, WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::scene::BloomSettings;
use crate::wasm::gl::{empty_vao, link_program, RenderTarget, FULLSCREEN_VERT};

const BRIGHT_FRAG: &str = r#"#version 300 es
precision mediump float;
uniform sampler2D u_scene;
uniform float u_threshold;
in vec2 v_uv;
out vec4 out_color;
void main() {
    vec4 c = texture(u_scene, v_uv);
    float lum = dot(c.rgb, vec3(0.2126, 0.7152, 0.0722));
    float keep = smoothstep(u_threshold, u_threshold + 0.01, lum);
    out_color = vec4(c.rgb * keep, c.a * keep);
}
"#;

// 9-tap separable gaussian.
const BLUR_FRAG: &str = r#"#version 300 es
precision mediump float;
uniform sampler2D u_source;
uniform vec2 u_step;
in vec2 v_uv;
out vec4 out_color;
void main() {
    float w[5] = float[](0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    vec4 sum = texture(u_source, v_uv) * w[0];
    for (int i = 1; i < 5; i++) {
        vec2 off = u_step * float(i);
        sum += texture(u_source, v_uv + off) * w[i];
        sum += texture(u_source, v_uv - off) * w[i];
    }
    out_color = sum;
}
"#;

const COMPOSITE_FRAG: &str = r#"#version 300 es
precision mediump float;
uniform sampler2D u_scene;
uniform sampler2D u_bloom;
uniform float u_strength;
in vec2 v_uv;
out vec4 out_color;
void main() {
    vec4 base = texture(u_scene, v_uv);
    vec4 glow = texture(u_bloom, v_uv) * u_strength;
    vec3 rgb = base.rgb + glow.rgb;
    float alpha = clamp(max(base.a, max(glow.r, max(glow.g, glow.b))), 0.0, 1.0);
    out_color = vec4(rgb, alpha);
}
"#;

/// Glow post-process: bright pass, blur at half resolution, additive
/// composite over the scene onto the canvas.
pub struct BloomPass {
    settings: BloomSettings,
    bright: WebGlProgram,
    blur: WebGlProgram,
    composite: WebGlProgram,
    u_threshold: Option<WebGlUniformLocation>,
    u_step: Option<WebGlUniformLocation>,
    u_strength: Option<WebGlUniformLocation>,
    ping: RenderTarget,
    pong: RenderTarget,
    vao: WebGlVertexArrayObject,
}

impl BloomPass {
    pub fn new(gl: &GL, settings: BloomSettings, width: i32, height: i32) -> Result<Self, JsValue> {
        let bright = link_program(gl, FULLSCREEN_VERT, BRIGHT_FRAG)?;
        let blur = link_program(gl, FULLSCREEN_VERT, BLUR_FRAG)?;
        let composite = link_program(gl, FULLSCREEN_VERT, COMPOSITE_FRAG)?;

        gl.use_program(Some(&bright));
        gl.uniform1i(gl.get_uniform_location(&bright, "u_scene").as_ref(), 0);
        gl.use_program(Some(&blur));
        gl.uniform1i(gl.get_uniform_location(&blur, "u_source").as_ref(), 0);
        gl.use_program(Some(&composite));
        gl.uniform1i(gl.get_uniform_location(&composite, "u_scene").as_ref(), 0);
        gl.uniform1i(gl.get_uniform_location(&composite, "u_bloom").as_ref(), 1);

        let (hw, hh) = half(width, height);
        Ok(Self {
            settings,
            u_threshold: gl.get_uniform_location(&bright, "u_threshold"),
            u_step: gl.get_uniform_location(&blur, "u_step"),
            u_strength: gl.get_uniform_location(&composite, "u_strength"),
            bright,
            blur,
            composite,
            ping: RenderTarget::new(gl, hw, hh)?,
            pong: RenderTarget::new(gl, hw, hh)?,
            vao: empty_vao(gl)?,
        })
    }

    pub fn set_size(&mut self, gl: &GL, width: i32, height: i32) -> Result<(), JsValue> {
        let (hw, hh) = half(width, height);
        self.ping.resize(gl, hw, hh)?;
        self.pong.resize(gl, hw, hh)
    }

    /// Reads `scene` and writes the final frame to the default framebuffer.
    pub fn render(&self, gl: &GL, scene: &RenderTarget, out_width: i32, out_height: i32) {
        gl.disable(GL::BLEND);
        gl.bind_vertex_array(Some(&self.vao));
        gl.active_texture(GL::TEXTURE0);

        self.ping.bind(gl);
        gl.use_program(Some(&self.bright));
        gl.uniform1f(self.u_threshold.as_ref(), self.settings.threshold);
        gl.bind_texture(GL::TEXTURE_2D, Some(&scene.texture));
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        let spread = 1.0 + self.settings.radius;
        gl.use_program(Some(&self.blur));
        self.pong.bind(gl);
        gl.uniform2f(self.u_step.as_ref(), spread / self.ping.width as f32, 0.0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.ping.texture));
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        self.ping.bind(gl);
        gl.uniform2f(self.u_step.as_ref(), 0.0, spread / self.pong.height as f32);
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.pong.texture));
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        gl.viewport(0, 0, out_width, out_height);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(GL::COLOR_BUFFER_BIT);
        gl.use_program(Some(&self.composite));
        gl.uniform1f(self.u_strength.as_ref(), self.settings.strength);
        gl.bind_texture(GL::TEXTURE_2D, Some(&scene.texture));
        gl.active_texture(GL::TEXTURE1);
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.ping.texture));
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        gl.active_texture(GL::TEXTURE0);
        gl.bind_vertex_array(None);
    }
}

fn half(width: i32, height: i32) -> (i32, i32) {
    ((width / 2).max(1), (height / 2).max(1))
}
