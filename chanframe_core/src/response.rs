//! Response variant family.
//!
//! Same split as positions: the tag lives in the index block, the payload in
//! the responses field group. Multi-stage responses carry a nested stage-filter
//! tag inline, since stages are not indexed.

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::primitives::{
    read_counted_pod_vec, read_f32, read_f64, read_i64, read_len, read_string, write_f32,
    write_f64, write_i64, write_len, write_pod_vec, write_string, MAX_ARRAY_LEN,
};
use crate::scratch::Scratch;

pub const RESPONSE_GENERIC: u8 = 0;
pub const RESPONSE_POLE_ZERO: u8 = 1;
pub const RESPONSE_COEFFICIENTS: u8 = 2;
pub const RESPONSE_MULTI_STAGE: u8 = 3;

pub const STAGE_NONE: u8 = 0;
pub const STAGE_POLE_ZERO: u8 = 1;
pub const STAGE_COEFFICIENTS: u8 = 2;

/// Tabulated complex response, `[re, im]` per frequency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericResp {
    pub description: String,
    pub values: Vec<[f64; 2]>,
}

/// Single-stage poles and zeros, complex values as `[re, im]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PzResp {
    /// Normalization constant.
    pub a0: f32,
    /// Normalization frequency.
    pub f0: f32,
    pub zeros: Vec<[f32; 2]>,
    pub poles: Vec<[f32; 2]>,
}

impl Default for PzResp {
    fn default() -> Self {
        Self {
            a0: 1.0,
            f0: 1.0,
            zeros: Vec::new(),
            poles: Vec::new(),
        }
    }
}

/// Digital filter coefficients, numerator `b` over denominator `a`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoeffResp {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum StageFilter {
    #[default]
    None,
    PoleZero(PzResp),
    Coefficients(CoeffResp),
}

/// One stage of a multi-stage response.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub filter: StageFilter,
    /// Input sample rate of the stage.
    pub fs: f64,
    pub gain: f64,
    /// Frequency at which `gain` applies.
    pub fg: f64,
    pub delay: f64,
    pub corr: f64,
    pub factor: i64,
    pub offset: i64,
    pub input_units: String,
    pub output_units: String,
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            filter: StageFilter::None,
            fs: 0.0,
            gain: 1.0,
            fg: 0.0,
            delay: 0.0,
            corr: 0.0,
            factor: 1,
            offset: 0,
            input_units: String::new(),
            output_units: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiStageResp {
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Generic(GenericResp),
    PoleZero(PzResp),
    Coefficients(CoeffResp),
    MultiStage(MultiStageResp),
}

impl Default for Response {
    fn default() -> Self {
        Self::PoleZero(PzResp::default())
    }
}

impl Response {
    pub const FAMILY: &'static str = "response";

    pub fn tag(&self) -> u8 {
        match self {
            Self::Generic(_) => RESPONSE_GENERIC,
            Self::PoleZero(_) => RESPONSE_POLE_ZERO,
            Self::Coefficients(_) => RESPONSE_COEFFICIENTS,
            Self::MultiStage(_) => RESPONSE_MULTI_STAGE,
        }
    }

    pub fn check_tag(tag: u8) -> Result<()> {
        if tag <= RESPONSE_MULTI_STAGE {
            Ok(())
        } else {
            Err(Error::UnknownVariantTag {
                family: Self::FAMILY,
                tag,
            })
        }
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> Result<()> {
        match self {
            Self::Generic(resp) => {
                write_string(w, &resp.description)?;
                write_pod_vec(w, &resp.values)
            }
            Self::PoleZero(resp) => encode_pz(w, resp),
            Self::Coefficients(resp) => encode_coeff(w, resp),
            Self::MultiStage(resp) => {
                write_len(w, resp.stages.len())?;
                for stage in &resp.stages {
                    encode_stage(w, stage)?;
                }
                Ok(())
            }
        }
    }

    pub fn decode<R: Read>(tag: u8, r: &mut R, scratch: &mut Scratch) -> Result<Self> {
        let resp = match tag {
            RESPONSE_GENERIC => Self::Generic(GenericResp {
                description: read_string(r, scratch)?,
                values: read_counted_pod_vec(r, "generic response")?,
            }),
            RESPONSE_POLE_ZERO => Self::PoleZero(decode_pz(r)?),
            RESPONSE_COEFFICIENTS => Self::Coefficients(decode_coeff(r)?),
            RESPONSE_MULTI_STAGE => {
                let n = read_len(r, "stage list", MAX_ARRAY_LEN)?;
                let mut stages = Vec::with_capacity(n.min(64));
                for _ in 0..n {
                    stages.push(decode_stage(r, scratch)?);
                }
                Self::MultiStage(MultiStageResp { stages })
            }
            _ => {
                return Err(Error::UnknownVariantTag {
                    family: Self::FAMILY,
                    tag,
                })
            }
        };
        Ok(resp)
    }
}

fn encode_pz<W: Write>(w: &mut W, resp: &PzResp) -> Result<()> {
    write_f32(w, resp.a0)?;
    write_f32(w, resp.f0)?;
    write_pod_vec(w, &resp.zeros)?;
    write_pod_vec(w, &resp.poles)
}

fn decode_pz<R: Read>(r: &mut R) -> Result<PzResp> {
    Ok(PzResp {
        a0: read_f32(r)?,
        f0: read_f32(r)?,
        zeros: read_counted_pod_vec(r, "zeros")?,
        poles: read_counted_pod_vec(r, "poles")?,
    })
}

fn encode_coeff<W: Write>(w: &mut W, resp: &CoeffResp) -> Result<()> {
    write_pod_vec(w, &resp.b)?;
    write_pod_vec(w, &resp.a)
}

fn decode_coeff<R: Read>(r: &mut R) -> Result<CoeffResp> {
    Ok(CoeffResp {
        b: read_counted_pod_vec(r, "numerator")?,
        a: read_counted_pod_vec(r, "denominator")?,
    })
}

fn encode_stage<W: Write>(w: &mut W, stage: &Stage) -> Result<()> {
    match &stage.filter {
        StageFilter::None => w.write_u8(STAGE_NONE)?,
        StageFilter::PoleZero(pz) => {
            w.write_u8(STAGE_POLE_ZERO)?;
            encode_pz(w, pz)?;
        }
        StageFilter::Coefficients(c) => {
            w.write_u8(STAGE_COEFFICIENTS)?;
            encode_coeff(w, c)?;
        }
    }
    for v in [stage.fs, stage.gain, stage.fg, stage.delay, stage.corr] {
        write_f64(w, v)?;
    }
    write_i64(w, stage.factor)?;
    write_i64(w, stage.offset)?;
    write_string(w, &stage.input_units)?;
    write_string(w, &stage.output_units)
}

fn decode_stage<R: Read>(r: &mut R, scratch: &mut Scratch) -> Result<Stage> {
    let filter = match r.read_u8()? {
        STAGE_NONE => StageFilter::None,
        STAGE_POLE_ZERO => StageFilter::PoleZero(decode_pz(r)?),
        STAGE_COEFFICIENTS => StageFilter::Coefficients(decode_coeff(r)?),
        tag => {
            return Err(Error::UnknownVariantTag {
                family: "response stage",
                tag,
            })
        }
    };
    Ok(Stage {
        filter,
        fs: read_f64(r)?,
        gain: read_f64(r)?,
        fg: read_f64(r)?,
        delay: read_f64(r)?,
        corr: read_f64(r)?,
        factor: read_i64(r)?,
        offset: read_i64(r)?,
        input_units: read_string(r, scratch)?,
        output_units: read_string(r, scratch)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip(resp: &Response) -> Response {
        let mut buf = Vec::new();
        resp.encode(&mut buf).unwrap();
        let mut cur = Cursor::new(&buf);
        let back = Response::decode(resp.tag(), &mut cur, &mut Scratch::new()).unwrap();
        assert_eq!(cur.position() as usize, buf.len(), "payload fully consumed");
        back
    }

    #[test]
    fn default_is_unit_pole_zero() {
        match Response::default() {
            Response::PoleZero(pz) => {
                assert_eq!(pz.a0, 1.0);
                assert_eq!(pz.f0, 1.0);
                assert!(pz.poles.is_empty() && pz.zeros.is_empty());
            }
            other => panic!("unexpected default {other:?}"),
        }
    }

    #[test]
    fn multi_stage_with_mixed_filters() {
        let resp = Response::MultiStage(MultiStageResp {
            stages: vec![
                Stage {
                    filter: StageFilter::PoleZero(PzResp {
                        a0: 2.0,
                        f0: 1.0,
                        zeros: vec![[0.0, 0.0], [0.0, 0.0]],
                        poles: vec![[-0.037, 0.037], [-0.037, -0.037]],
                    }),
                    gain: 1500.0,
                    input_units: "m/s".into(),
                    output_units: "V".into(),
                    ..Stage::default()
                },
                Stage {
                    filter: StageFilter::Coefficients(CoeffResp {
                        b: vec![0.25, 0.5, 0.25],
                        a: vec![1.0],
                    }),
                    fs: 200.0,
                    factor: 2,
                    delay: 0.005,
                    ..Stage::default()
                },
                Stage::default(),
            ],
        });
        assert_eq!(round_trip(&resp), resp);
    }

    #[test]
    fn unknown_stage_tag_is_fatal() {
        let mut buf = Vec::new();
        write_len(&mut buf, 1).unwrap();
        buf.push(9);
        let err = Response::decode(RESPONSE_MULTI_STAGE, &mut Cursor::new(&buf), &mut Scratch::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownVariantTag { family: "response stage", tag: 9 }));
    }
}
