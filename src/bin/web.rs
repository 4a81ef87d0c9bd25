use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ndarray::{Array1, Array2, Ix2};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use h_orbital::constants::{DEFAULT_COVERAGE, MIN_CLI_POINTS};
use h_orbital::pipeline::{evaluate_slice, spherical_harmonic_map};
use h_orbital::render::{
    encode_png, render_mode_data, render_radial_distribution, FieldStyle,
};
use h_orbital::{
    auto_extent_a0, build_plane_grid, decide, enforce_scale, radial_distribution,
    resolve_colormap, resolve_scale, ModeData, OrbitalError, Overrides, QuantumNumbers,
    RenderDecision, RenderMode, ScaleEnforcement, ScaleRequest,
};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const WEB_DEFAULT_POINTS: usize = 201;
const WEB_MAX_POINTS: usize = 801;
/// Largest principal quantum number served.
const WEB_MAX_N: i64 = 20;
const RADIAL_CANVAS: (u32, u32) = (960, 640);

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Hydrogen orbitals</title>
    <style>
      body { font-family: system-ui, sans-serif; margin: 2rem; background: #111; color: #ddd; }
      form { display: flex; gap: 0.5rem; flex-wrap: wrap; margin-bottom: 1rem; }
      input, select { width: 6rem; }
      img { max-width: 100%; border: 1px solid #333; }
      pre { color: #9c9; }
    </style>
  </head>
  <body>
    <h1>Hydrogen orbital slices</h1>
    <form id="controls">
      <label>n <input name="n" type="number" value="2" min="1" /></label>
      <label>l <input name="l" type="number" value="1" min="0" /></label>
      <label>m <input name="m" type="number" value="0" /></label>
      <label>mode
        <select name="mode">
          <option>real</option><option>imag</option><option>real_imag</option><option>density</option>
        </select>
      </label>
      <label>scale
        <select name="scale">
          <option>linear</option><option>auto</option><option>log</option><option>symlog</option>
        </select>
      </label>
      <label><input name="line_mode" type="checkbox" value="true" /> contours only</label>
      <button type="submit">Render</button>
    </form>
    <pre id="decision"></pre>
    <img id="slice" alt="orbital slice" />
    <script>
      const form = document.getElementById("controls");
      async function render() {
        const params = new URLSearchParams(new FormData(form));
        params.set("colorbar", "true");
        const res = await fetch("/decision?" + params);
        document.getElementById("decision").textContent = JSON.stringify(await res.json(), null, 2);
        document.getElementById("slice").src = "/slice.png?" + params;
      }
      form.addEventListener("submit", (e) => { e.preventDefault(); render(); });
      render();
    </script>
  </body>
</html>
"##;

#[derive(Debug, Default, Deserialize)]
struct OrbitalQuery {
    n: Option<i64>,
    l: Option<i64>,
    m: Option<i64>,
    mode: Option<String>,
    plane: Option<String>,
    value: Option<f64>,
    range: Option<f64>,
    points: Option<usize>,
    scale: Option<String>,
    cmap: Option<String>,
    colorbar: Option<bool>,
    line_mode: Option<bool>,
}

impl OrbitalQuery {
    fn quantum_numbers(&self) -> Result<QuantumNumbers, OrbitalError> {
        let n = self.n.unwrap_or(2);
        if n > WEB_MAX_N {
            return Err(OrbitalError::InvalidQuantumNumbers(format!(
                "Principal quantum number n must be <= {WEB_MAX_N} for this service."
            )));
        }
        QuantumNumbers::new(n, self.l.unwrap_or(1), self.m.unwrap_or(0))
    }

    fn mode(&self, default: RenderMode) -> Result<RenderMode, OrbitalError> {
        self.mode.as_deref().map_or(Ok(default), |mode| mode.parse())
    }

    fn points(&self) -> usize {
        self.points
            .unwrap_or(WEB_DEFAULT_POINTS)
            .clamp(MIN_CLI_POINTS, WEB_MAX_POINTS)
    }

    fn overrides(&self) -> Result<Overrides, OrbitalError> {
        let plane = match self.plane.as_deref() {
            None | Some("auto") => None,
            Some(plane) => Some(plane.parse()?),
        };
        let scale = match self.scale.as_deref() {
            None => ScaleRequest::default(),
            Some(scale) => scale.parse()?,
        };
        Ok(Overrides {
            plane,
            value_a0: self.value,
            extent_a0: self.range,
            scale,
        })
    }
}

#[derive(Debug)]
enum ApiError {
    BadRequest(OrbitalError),
    Internal(String),
}

impl From<OrbitalError> for ApiError {
    fn from(e: OrbitalError) -> Self {
        ApiError::BadRequest(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Internal(e) => {
                log::error!("request worker failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e)
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
struct DecisionResponse {
    orbital: String,
    n: u32,
    l: u32,
    m: i32,
    mode: RenderMode,
    decision: RenderDecision,
    cmap: String,
    note: Option<String>,
}

#[derive(Serialize)]
struct SliceResponse {
    #[serde(flatten)]
    summary: DecisionResponse,
    axis: Vec<f64>,
    u_label: &'static str,
    v_label: &'static str,
    plane_label: String,
    data: Option<Vec<Vec<f64>>>,
    real: Option<Vec<Vec<f64>>>,
    imag: Option<Vec<Vec<f64>>>,
}

#[derive(Serialize)]
struct RadialResponse {
    orbital: String,
    extent_a0: f64,
    peak_r_a0: f64,
    r_a0: Vec<f64>,
    probability: Vec<f64>,
}

#[derive(Serialize)]
struct HarmonicResponse {
    orbital: String,
    l: u32,
    m: i32,
    theta: Vec<f64>,
    phi: Vec<f64>,
    real: Vec<Vec<f64>>,
    imag: Vec<Vec<f64>>,
}

fn rows(field: &Array2<f64>) -> Vec<Vec<f64>> {
    field.outer_iter().map(|row| row.to_vec()).collect()
}

fn summarize(q: &OrbitalQuery) -> Result<DecisionResponse, OrbitalError> {
    let qn = q.quantum_numbers()?;
    let mode = q.mode(RenderMode::Real)?;
    let overrides = q.overrides()?;

    let requested = resolve_scale(mode, overrides.scale);
    let decision = decide(qn, mode, &overrides, ScaleEnforcement::Coerce)?;
    let note = (decision.scale != requested).then(|| {
        format!(
            "scale {requested} cannot represent mode {mode}; using {}",
            decision.scale
        )
    });

    Ok(DecisionResponse {
        orbital: qn.label(),
        n: qn.n(),
        l: qn.l(),
        m: qn.m(),
        mode,
        decision,
        cmap: resolve_colormap(mode, q.cmap.as_deref()),
        note,
    })
}

fn compute_slice(q: &OrbitalQuery) -> Result<(SliceResponse, ModeData<Ix2>), OrbitalError> {
    let summary = summarize(q)?;
    if !summary.mode.is_slice_field() {
        return Err(OrbitalError::UnsupportedMode(format!(
            "{} has no planar slice",
            summary.mode
        )));
    }
    let qn = q.quantum_numbers()?;
    let decision = summary.decision;
    let grid = build_plane_grid(decision.plane, decision.value_a0, decision.extent_a0, q.points())?;
    let data = evaluate_slice(qn, summary.mode, &grid)?;

    let (field, real, imag) = match &data {
        ModeData::Scalar(field) => (Some(rows(field)), None, None),
        ModeData::RealImag { real, imag } => (None, Some(rows(real)), Some(rows(imag))),
    };
    let response = SliceResponse {
        summary,
        axis: grid.axis.to_vec(),
        u_label: grid.u_label,
        v_label: grid.v_label,
        plane_label: grid.plane_label,
        data: field,
        real,
        imag,
    };
    Ok((response, data))
}

fn slice_png_bytes(q: &OrbitalQuery) -> Result<Vec<u8>, OrbitalError> {
    let (slice, data) = compute_slice(q)?;
    let style = FieldStyle {
        cmap: &slice.summary.cmap,
        scale: slice.summary.decision.scale,
        colorbar: q.colorbar.unwrap_or(false),
        line_mode: q.line_mode.unwrap_or(false),
    };
    let image = render_mode_data(&data, slice.summary.mode, style)?;
    encode_png(&image)
}

fn compute_radial(q: &OrbitalQuery) -> Result<RadialResponse, OrbitalError> {
    let qn = q.quantum_numbers()?;
    let mode = RenderMode::RadialDistribution;
    let extent_a0 = match q.range {
        Some(range) => range,
        None => auto_extent_a0(qn, mode, DEFAULT_COVERAGE),
    };
    let (r_a0, prob) = radial_distribution(qn, extent_a0, q.points())?;

    let mut peak = 0;
    for (i, &p) in prob.iter().enumerate() {
        if p > prob[peak] {
            peak = i;
        }
    }

    Ok(RadialResponse {
        orbital: qn.label(),
        extent_a0,
        peak_r_a0: r_a0[peak],
        r_a0: r_a0.to_vec(),
        probability: prob.to_vec(),
    })
}

fn radial_png_bytes(q: &OrbitalQuery) -> Result<Vec<u8>, OrbitalError> {
    let radial = compute_radial(q)?;
    let image = render_radial_distribution(
        &Array1::from(radial.r_a0),
        &Array1::from(radial.probability),
        RADIAL_CANVAS.0,
        RADIAL_CANVAS.1,
    )?;
    encode_png(&image)
}

fn compute_harmonic(q: &OrbitalQuery) -> Result<HarmonicResponse, OrbitalError> {
    let qn = q.quantum_numbers()?;
    let (grid, data) = spherical_harmonic_map(qn, q.points())?;
    let ModeData::RealImag { real, imag } = data else {
        return Err(OrbitalError::Render("harmonic map must be complex".to_string()));
    };
    Ok(HarmonicResponse {
        orbital: qn.label(),
        l: qn.l(),
        m: qn.m(),
        theta: grid.theta.column(0).to_vec(),
        phi: grid.phi.row(0).to_vec(),
        real: rows(&real),
        imag: rows(&imag),
    })
}

fn harmonic_png_bytes(q: &OrbitalQuery) -> Result<Vec<u8>, OrbitalError> {
    let qn = q.quantum_numbers()?;
    let mode = RenderMode::SphericalHarmonic;
    let requested = match q.scale.as_deref() {
        None => ScaleRequest::default(),
        Some(scale) => scale.parse()?,
    };
    let scale = enforce_scale(mode, resolve_scale(mode, requested), ScaleEnforcement::Coerce)?;
    let cmap = resolve_colormap(mode, q.cmap.as_deref());
    let (_, data) = spherical_harmonic_map(qn, q.points())?;
    let style = FieldStyle {
        cmap: &cmap,
        scale,
        colorbar: q.colorbar.unwrap_or(false),
        line_mode: q.line_mode.unwrap_or(false),
    };
    encode_png(&render_mode_data(&data, mode, style)?)
}

fn png(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn decision(Query(q): Query<OrbitalQuery>) -> Result<Json<DecisionResponse>, ApiError> {
    let out = tokio::task::spawn_blocking(move || summarize(&q)).await??;
    Ok(Json(out))
}

async fn slice(Query(q): Query<OrbitalQuery>) -> Result<Json<SliceResponse>, ApiError> {
    let (out, _) = tokio::task::spawn_blocking(move || compute_slice(&q)).await??;
    Ok(Json(out))
}

async fn slice_png(Query(q): Query<OrbitalQuery>) -> Result<Response, ApiError> {
    let bytes = tokio::task::spawn_blocking(move || slice_png_bytes(&q)).await??;
    Ok(png(bytes))
}

async fn radial(Query(q): Query<OrbitalQuery>) -> Result<Json<RadialResponse>, ApiError> {
    let out = tokio::task::spawn_blocking(move || compute_radial(&q)).await??;
    Ok(Json(out))
}

async fn radial_png(Query(q): Query<OrbitalQuery>) -> Result<Response, ApiError> {
    let bytes = tokio::task::spawn_blocking(move || radial_png_bytes(&q)).await??;
    Ok(png(bytes))
}

async fn harmonic(Query(q): Query<OrbitalQuery>) -> Result<Json<HarmonicResponse>, ApiError> {
    let out = tokio::task::spawn_blocking(move || compute_harmonic(&q)).await??;
    Ok(Json(out))
}

async fn harmonic_png(Query(q): Query<OrbitalQuery>) -> Result<Response, ApiError> {
    let bytes = tokio::task::spawn_blocking(move || harmonic_png_bytes(&q)).await??;
    Ok(png(bytes))
}

fn bind_addr() -> SocketAddr {
    let fallback = SocketAddr::from(([127, 0, 0, 1], 3000));
    match std::env::var("H_ORBITAL_ADDR") {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            log::warn!("ignoring H_ORBITAL_ADDR={raw:?} ({e}); using {DEFAULT_ADDR}");
            fallback
        }),
        Err(_) => fallback,
    }
}

fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/decision", get(decision))
        .route("/slice", get(slice))
        .route("/slice.png", get(slice_png))
        .route("/radial", get(radial))
        .route("/radial.png", get(radial_png))
        .route("/harmonic", get(harmonic))
        .route("/harmonic.png", get(harmonic_png))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let addr = bind_addr();
    println!("Serving on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(n: i64, l: i64, m: i64) -> OrbitalQuery {
        OrbitalQuery {
            n: Some(n),
            l: Some(l),
            m: Some(m),
            points: Some(31),
            ..OrbitalQuery::default()
        }
    }

    #[test]
    fn test_points_are_clamped() {
        let mut q = OrbitalQuery::default();
        assert_eq!(q.points(), WEB_DEFAULT_POINTS);
        q.points = Some(3);
        assert_eq!(q.points(), MIN_CLI_POINTS);
        q.points = Some(100_000);
        assert_eq!(q.points(), WEB_MAX_POINTS);
    }

    #[test]
    fn test_large_principal_numbers_are_refused() {
        let at_limit = query(WEB_MAX_N, 0, 0);
        assert_eq!(at_limit.quantum_numbers().unwrap().n(), WEB_MAX_N as u32);

        let huge = query(100_000, 1, 0);
        let err = summarize(&huge).unwrap_err();
        assert!(matches!(err, OrbitalError::InvalidQuantumNumbers(_)));
        assert_eq!(
            ApiError::from(err).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert!(compute_radial(&query(WEB_MAX_N + 1, 0, 0)).is_err());
    }

    #[test]
    fn test_coerced_scale_is_reported() {
        let mut q = query(2, 1, 0);
        q.scale = Some("log".to_string());
        q.range = Some(8.0);
        let summary = summarize(&q).unwrap();
        assert_eq!(summary.decision.scale, h_orbital::Scale::Symlog);
        assert!(summary.note.is_some());

        let mut q = query(2, 1, 0);
        q.mode = Some("density".to_string());
        q.scale = Some("symlog".to_string());
        q.range = Some(8.0);
        let summary = summarize(&q).unwrap();
        assert_eq!(summary.decision.scale, h_orbital::Scale::Linear);
        assert!(summary.note.is_some());
    }

    #[test]
    fn test_slice_payload_matches_mode() {
        let mut q = query(2, 1, 1);
        q.mode = Some("real_imag".to_string());
        q.plane = Some("z".to_string());
        q.range = Some(10.0);
        let (slice, _) = compute_slice(&q).unwrap();
        assert_eq!(slice.axis.len(), 31);
        assert!(slice.data.is_none());
        assert_eq!(slice.real.as_ref().map(Vec::len), Some(31));
        assert_eq!(slice.imag.as_ref().map(|rows| rows[0].len()), Some(31));
        assert_eq!((slice.u_label, slice.v_label), ("X", "Y"));
    }

    #[test]
    fn test_profile_modes_have_no_slice() {
        let mut q = query(2, 1, 0);
        q.mode = Some("radial_distribution".to_string());
        assert!(matches!(
            compute_slice(&q),
            Err(OrbitalError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn test_radial_peak_for_1s() {
        let mut q = query(1, 0, 0);
        q.range = Some(6.0);
        q.points = Some(601);
        let radial = compute_radial(&q).unwrap();
        assert!((radial.peak_r_a0 - 1.0).abs() < 0.02);
        assert_eq!(radial.r_a0.len(), 601);
    }

    #[test]
    fn test_harmonic_axes() {
        let harmonic = compute_harmonic(&query(3, 2, -2)).unwrap();
        assert_eq!(harmonic.theta.len(), 31);
        assert!(harmonic.theta[0].abs() < 1e-12);
        assert!((harmonic.phi[0] + std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_png_endpoints_encode() {
        let mut q = query(2, 1, 0);
        q.range = Some(8.0);
        q.plane = Some("x".to_string());
        let bytes = slice_png_bytes(&q).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(&radial_png_bytes(&q).unwrap()[1..4], b"PNG");
        assert_eq!(&harmonic_png_bytes(&q).unwrap()[1..4], b"PNG");

        q.line_mode = Some(true);
        let lines = slice_png_bytes(&q).unwrap();
        assert_eq!(&lines[1..4], b"PNG");
        assert_ne!(lines, bytes);
    }

    #[test]
    fn test_errors_map_to_bad_request() {
        let invalid = query(2, 2, 0);
        let err = summarize(&invalid).unwrap_err();
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut bad_mode = query(2, 1, 0);
        bad_mode.mode = Some("bogus".to_string());
        assert!(matches!(
            summarize(&bad_mode),
            Err(OrbitalError::UnsupportedMode(_))
        ));
    }
}
