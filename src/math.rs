
//! Simple math utilities.


/// Simple two-dimensional vector of any numerical type.
/// Supports only few mathematical operations
/// as this is used mainly as data struct.
/// The first component is the horizontal x coordinate (or width),
/// the second component is the vertical y coordinate (or height).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vec2<T> (pub T, pub T);

impl<T> Vec2<T> {

    /// Maps all components of this vector to a new type, yielding a vector of that new type.
    pub fn map<B>(self, map: impl Fn(T) -> B) -> Vec2<B> {
        Vec2(map(self.0), map(self.1))
    }

    /// Seeing this vector as a dimension or size (width and height),
    /// this returns the area that this dimensions contains (`width * height`).
    #[inline]
    pub fn area(self) -> T where T: std::ops::Mul<T, Output = T> {
        self.0 * self.1
    }

    /// The first component of this 2D vector.
    #[inline]
    pub fn x(self) -> T { self.0 }

    /// The second component of this 2D vector.
    #[inline]
    pub fn y(self) -> T { self.1 }

    /// The first component of this 2D vector.
    #[inline]
    pub fn width(self) -> T { self.0 }

    /// The second component of this 2D vector.
    #[inline]
    pub fn height(self) -> T { self.1 }
}


impl<T: std::ops::Add<T>> std::ops::Add<Vec2<T>> for Vec2<T> {
    type Output = Vec2<T::Output>;
    fn add(self, other: Vec2<T>) -> Self::Output {
        Vec2(self.0 + other.0, self.1 + other.1)
    }
}

impl<T: std::ops::Mul<T>> std::ops::Mul<Vec2<T>> for Vec2<T> {
    type Output = Vec2<T::Output>;
    fn mul(self, other: Vec2<T>) -> Self::Output {
        Vec2(self.0 * other.0, self.1 * other.1)
    }
}

impl<T: std::ops::Div<T>> std::ops::Div<Vec2<T>> for Vec2<T> {
    type Output = Vec2<T::Output>;
    fn div(self, other: Vec2<T>) -> Self::Output {
        Vec2(self.0 / other.0, self.1 / other.1)
    }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self { Vec2(x, y) }
}

impl<T> From<Vec2<T>> for (T, T) {
    fn from(vec2: Vec2<T>) -> Self { (vec2.0, vec2.1) }
}


#[cfg(test)]
mod test {
    use super::Vec2;

    #[test]
    fn component_wise_operations() {
        assert_eq!(Vec2(17_usize, 9) / Vec2(8, 8), Vec2(2, 1));
        assert_eq!(Vec2(2_usize, 1) * Vec2(8, 8), Vec2(16, 8));
        assert_eq!(Vec2(3_usize, 4).area(), 12);
        assert_eq!(Vec2(3_u32, 4).map(|value| value as usize + 1), Vec2(4, 5));
    }
}
