//! CRD manifest generator
//!
//! Prints the ResourcePreset CRD as YAML, ready for `kubectl apply -f -`.

use crds::ResourcePreset;
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&ResourcePreset::crd())?);
    Ok(())
}
