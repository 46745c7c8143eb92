//! 전송 계층 바이트 정규화.
//!
//! 일부 adb 전송은 바이너리 스트림 안의 LF(0x0A)를 CR LF로 바꿔 버린다.
//! 각 `DecodeVariant`는 알려진 변형 하나를 되돌리는 규칙이다.

use std::borrow::Cow;
use std::fmt;

/// 디코딩 변형 (바이트 정규화 규칙)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DecodeVariant {
    /// 0: 바이트 그대로
    Raw = 0,
    /// 1: `CR LF` → `LF`
    CrLf = 1,
    /// 2: `CR CR LF` → `LF`
    CrCrLf = 2,
}

impl DecodeVariant {
    /// 기본 시도 순서
    pub const ALL: [DecodeVariant; 3] = [DecodeVariant::Raw, DecodeVariant::CrLf, DecodeVariant::CrCrLf];

    /// 서수 (0/1/2)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// 원시 바이트에 정규화 규칙 적용.
    ///
    /// 패턴이 없으면 복사 없이 원본을 빌려 반환한다.
    pub fn normalize(self, raw: &[u8]) -> Cow<'_, [u8]> {
        match self {
            DecodeVariant::Raw => Cow::Borrowed(raw),
            DecodeVariant::CrLf => collapse_to_lf(raw, b"\r\n"),
            DecodeVariant::CrCrLf => collapse_to_lf(raw, b"\r\r\n"),
        }
    }
}

impl fmt::Display for DecodeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeVariant::Raw => write!(f, "raw"),
            DecodeVariant::CrLf => write!(f, "crlf"),
            DecodeVariant::CrCrLf => write!(f, "crcrlf"),
        }
    }
}

/// `pattern`의 모든 출현을 `LF` 한 바이트로 치환 (왼쪽부터, 겹치지 않게)
fn collapse_to_lf<'a>(raw: &'a [u8], pattern: &[u8]) -> Cow<'a, [u8]> {
    if !raw.windows(pattern.len()).any(|w| w == pattern) {
        return Cow::Borrowed(raw);
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i..].starts_with(pattern) {
            out.push(b'\n');
            i += pattern.len();
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Cow::Owned(out)
}
