use ndarray::Array2;

/// 人物シルエットの二値マスク
///
/// セグメンテーションモデルの出力をそのまま保持する。
/// 正の画素 = 人物、0 = 背景。座標系はキーポイントと同じピクセル座標。
pub struct SilhouetteMask {
    data: Array2<u8>,
}

impl SilhouetteMask {
    pub fn new(data: Array2<u8>) -> Self {
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// 指定行の人物画素の左端・右端の列を返す
    ///
    /// 行が範囲外、または人物画素を含まない場合は None。
    pub fn row_span(&self, y: usize) -> Option<(usize, usize)> {
        if y >= self.height() {
            return None;
        }
        let row = self.data.row(y);
        let left = row.iter().position(|&v| v > 0)?;
        let right = row.iter().rposition(|&v| v > 0)?;
        Some((left, right))
    }

    /// 指定行の人物幅（ピクセル）
    pub fn row_width(&self, y: usize) -> Option<f32> {
        let (left, right) = self.row_span(y)?;
        Some((right - left) as f32)
    }
}
