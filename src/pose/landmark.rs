use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MediaPipe BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    /// Points a body side needs before it is trusted: shoulder, hip, knee, ankle, heel, toe.
    pub const LEFT_SIDE: [LandmarkIndex; 6] = [
        Self::LeftShoulder,
        Self::LeftHip,
        Self::LeftKnee,
        Self::LeftAnkle,
        Self::LeftHeel,
        Self::LeftFootIndex,
    ];

    pub const RIGHT_SIDE: [LandmarkIndex; 6] = [
        Self::RightShoulder,
        Self::RightHip,
        Self::RightKnee,
        Self::RightAnkle,
        Self::RightHeel,
        Self::RightFootIndex,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        use LandmarkIndex::*;
        const ALL: [LandmarkIndex; LandmarkIndex::COUNT] = [
            Nose, LeftEyeInner, LeftEye, LeftEyeOuter, RightEyeInner, RightEye,
            RightEyeOuter, LeftEar, RightEar, MouthLeft, MouthRight,
            LeftShoulder, RightShoulder, LeftElbow, RightElbow, LeftWrist,
            RightWrist, LeftPinky, RightPinky, LeftIndex, RightIndex,
            LeftThumb, RightThumb, LeftHip, RightHip, LeftKnee, RightKnee,
            LeftAnkle, RightAnkle, LeftHeel, RightHeel, LeftFootIndex,
            RightFootIndex,
        ];
        ALL.get(index).copied()
    }
}

/// フレームのピクセルサイズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// ピクセル座標（整数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// カメラ基準の奥行き（小さいほど手前）
    #[serde(default)]
    pub z: f32,
    /// 可視性スコア (0.0〜1.0)
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// 可視性が閾値を超えているか（厳密な `>`）
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    /// ピクセル座標に変換（0方向に切り捨て）
    pub fn to_pixel(&self, size: FrameSize) -> PixelPoint {
        let px = (self.x * size.width as f32) as i32;
        let py = (self.y * size.height as f32) as i32;
        PixelPoint::new(px, py)
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 0.0,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected {expected} landmarks, got {actual}")]
pub struct LandmarkCountError {
    pub expected: usize,
    pub actual: usize,
}

/// 33ランドマークからなる1フレーム分の入力
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    pub landmarks: [Landmark; LandmarkIndex::COUNT],
}

impl LandmarkFrame {
    pub fn new(landmarks: [Landmark; LandmarkIndex::COUNT]) -> Self {
        Self { landmarks }
    }

    pub fn get(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks[index as usize]
    }

    pub fn set(&mut self, index: LandmarkIndex, landmark: Landmark) {
        self.landmarks[index as usize] = landmark;
    }

    pub fn pixel(&self, index: LandmarkIndex, size: FrameSize) -> PixelPoint {
        self.get(index).to_pixel(size)
    }
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::default(); LandmarkIndex::COUNT],
        }
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkFrame {
    type Error = LandmarkCountError;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self, Self::Error> {
        let actual = landmarks.len();
        let landmarks: [Landmark; LandmarkIndex::COUNT] =
            landmarks.try_into().map_err(|_| LandmarkCountError {
                expected: LandmarkIndex::COUNT,
                actual,
            })?;
        Ok(Self::new(landmarks))
    }
}
