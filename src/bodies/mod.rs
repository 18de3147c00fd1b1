mod rigid_body;
mod body_type;

pub use self::rigid_body::RigidBody;
pub use self::body_type::RigidBodyType;
