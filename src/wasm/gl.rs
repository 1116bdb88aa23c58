//! Small WebGL2 helpers shared by the point and bloom passes.

use wasm_bindgen::JsValue;
use web_sys::{
    WebGl2RenderingContext as GL, WebGlFramebuffer, WebGlProgram, WebGlShader, WebGlTexture,
    WebGlVertexArrayObject,
};

/// Full-screen triangle generated from `gl_VertexID`; needs no buffers.
pub const FULLSCREEN_VERT: &str = r#"#version 300 es
out vec2 v_uv;
void main() {
    vec2 p = vec2(float((gl_VertexID << 1) & 2), float(gl_VertexID & 2));
    v_uv = p;
    gl_Position = vec4(p * 2.0 - 1.0, 0.0, 1.0);
}
"#;

pub fn compile_shader(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl.create_shader(kind).ok_or("unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(JsValue::from_str(&format!("shader compile failed: {log}")))
    }
}

pub fn link_program(gl: &GL, vert_src: &str, frag_src: &str) -> Result<WebGlProgram, JsValue> {
    let vert = compile_shader(gl, GL::VERTEX_SHADER, vert_src)?;
    let frag = compile_shader(gl, GL::FRAGMENT_SHADER, frag_src)?;
    let program = gl.create_program().ok_or("unable to create program")?;
    gl.attach_shader(&program, &vert);
    gl.attach_shader(&program, &frag);
    gl.link_program(&program);
    // Shaders are owned by the program once linked.
    gl.delete_shader(Some(&vert));
    gl.delete_shader(Some(&frag));

    let ok = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(JsValue::from_str(&format!("program link failed: {log}")))
    }
}

/// Empty VAO to bind while drawing the full-screen triangle.
pub fn empty_vao(gl: &GL) -> Result<WebGlVertexArrayObject, JsValue> {
    gl.create_vertex_array().ok_or_else(|| "unable to create vertex array".into())
}

/// Colour texture with a framebuffer around it, resized on demand.
pub struct RenderTarget {
    pub framebuffer: WebGlFramebuffer,
    pub texture: WebGlTexture,
    pub width: i32,
    pub height: i32,
}

impl RenderTarget {
    pub fn new(gl: &GL, width: i32, height: i32) -> Result<Self, JsValue> {
        let texture = gl.create_texture().ok_or("unable to create texture")?;
        gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
        for (param, value) in [
            (GL::TEXTURE_MIN_FILTER, GL::LINEAR),
            (GL::TEXTURE_MAG_FILTER, GL::LINEAR),
            (GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE),
            (GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE),
        ] {
            gl.tex_parameteri(GL::TEXTURE_2D, param, value as i32);
        }

        let framebuffer = gl.create_framebuffer().ok_or("unable to create framebuffer")?;
        let mut target = Self {
            framebuffer,
            texture,
            width: 0,
            height: 0,
        };
        target.resize(gl, width, height)?;

        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&target.framebuffer));
        gl.framebuffer_texture_2d(
            GL::FRAMEBUFFER,
            GL::COLOR_ATTACHMENT0,
            GL::TEXTURE_2D,
            Some(&target.texture),
            0,
        );
        let status = gl.check_framebuffer_status(GL::FRAMEBUFFER);
        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        if status != GL::FRAMEBUFFER_COMPLETE {
            return Err(JsValue::from_str(&format!("framebuffer incomplete: 0x{status:x}")));
        }
        Ok(target)
    }

    /// Reallocates the texture storage; contents are undefined afterwards.
    pub fn resize(&mut self, gl: &GL, width: i32, height: i32) -> Result<(), JsValue> {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.texture));
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA8 as i32,
            width,
            height,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            None,
        )?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn bind(&self, gl: &GL) {
        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&self.framebuffer));
        gl.viewport(0, 0, self.width, self.height);
    }
}
