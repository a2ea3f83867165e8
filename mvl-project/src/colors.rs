/// Assigns each joint a display color by partitioning the RGB cube.
///
/// With `n` joints the cube of `256^3` colors is split into `n` equal strides
/// starting from white, and joint `i` takes the three big-endian bytes of
/// `0xFFFFFF - stride * i`. The colors are not guaranteed to be perceptually
/// distinct for large `n`, but they are stable across sessions, which is what
/// the annotation overlay needs.
pub fn joint_colors(joints: usize) -> Vec<[u8; 3]> {
    if joints == 0 {
        return Vec::new();
    }
    let stride = 256u32.pow(3) / joints as u32;
    (0..joints as u32)
        .map(|i| {
            let color = 0xFF_FF_FF - stride * i;
            [(color >> 16) as u8, (color >> 8) as u8, color as u8]
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_joint_is_white() {
        assert_eq!(joint_colors(4)[0], [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn colors_partition_the_cube() {
        let colors = joint_colors(4);
        assert_eq!(colors.len(), 4);
        // Stride of 256^3 / 4 steps the red channel down by 64 per joint.
        assert_eq!(colors[1], [0xBF, 0xFF, 0xFF]);
        assert_eq!(colors[2], [0x7F, 0xFF, 0xFF]);
        assert_eq!(colors[3], [0x3F, 0xFF, 0xFF]);
    }

    #[test]
    fn no_joints_no_colors() {
        assert!(joint_colors(0).is_empty());
    }
}
