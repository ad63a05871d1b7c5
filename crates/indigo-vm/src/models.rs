//! Indigo VM API models.
//!
//! Field names follow the vendor's JSON exactly, including the irregular ones
//! (`otherstatus`, `uidgid`, `sshkey_id`), so most structs need no renames.
//! Request bodies use the API's camelCase keys.

use chrono::NaiveDateTime;
use indigo_core::Error;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Format of the `date` field in [`InstanceDate`], e.g. `2018-11-10 10:03:17.744562`.
pub const INSTANCE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Timestamp record embedded in an [`Instance`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceDate {
    /// Local date and time, e.g. `2018-11-10 10:03:17.744562`.
    pub date: String,
    /// PHP-style timezone type code (3 means a named zone).
    pub timezone_type: i32,
    /// Timezone name, e.g. `UTC`.
    pub timezone: String,
}

impl InstanceDate {
    /// Parse [`date`](Self::date) without applying the timezone.
    #[must_use]
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, INSTANCE_DATE_FORMAT).ok()
    }
}

/// Virtual machine snapshot as returned by the instance creation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    /// Instance id.
    pub id: u64,
    /// Display name.
    pub instance_name: String,
    /// Set number.
    pub set_no: u64,
    /// VPS kind code.
    pub vps_kind: String,
    /// Sequence number.
    pub sequence_id: u64,
    /// Owning user id.
    pub user_id: u64,
    /// Service id, e.g. `wsi-000001`.
    pub service_id: String,
    /// Lifecycle status, e.g. `UNUSED` or `OPEN`.
    pub status: String,
    /// SSH key installed on the instance.
    pub sshkey_id: u64,
    /// When the instance was started.
    pub start_date: InstanceDate,
    /// Hosting server id.
    pub host_id: u64,
    /// Plan name, e.g. `2CR2GB`.
    pub plan: String,
    /// Disk allocation in GB.
    pub disk_point: u64,
    /// Memory size in GB.
    pub memsize: u64,
    /// Number of CPUs.
    pub cpus: u32,
    /// Operating system id.
    pub os_id: u64,
    /// Secondary status code.
    pub otherstatus: u32,
    /// Instance UUID as sent by the API.
    pub uuid: String,
    /// Unix uid/gid assigned to the instance.
    pub uidgid: u64,
    /// VNC console port.
    pub vnc_port: u32,
    /// VNC console password.
    pub vnc_passwd: String,
    /// Reverse DNS name; `null` decodes as empty.
    #[serde(deserialize_with = "null_as_empty")]
    pub arpaname: String,
    /// Reverse DNS registration date; empty or `null` when unset.
    #[serde(deserialize_with = "null_as_empty")]
    pub arpadate: String,
    /// When the status last changed.
    pub status_change_date: InstanceDate,
    /// Last update time; the API sends `null` for new instances.
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Revert flag.
    pub vm_revert: u32,
}

impl Instance {
    /// Parse the [`uuid`](Self::uuid) field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUuid`] if the API sent a malformed UUID.
    pub fn parsed_uuid(&self) -> Result<Uuid, Error> {
        Ok(Uuid::parse_str(&self.uuid)?)
    }
}

// The reverse DNS fields are filled in lazily and arrive as `null` until then.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Create an instance with an SSH key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceRequest {
    /// SSH key to install.
    pub ssh_key_id: u64,
    /// Region to place the instance in.
    pub region_id: u64,
    /// Operating system id.
    pub os_id: u64,
    /// Plan id.
    pub instance_plan: u64,
    /// Display name.
    pub instance_name: String,
}

/// Create a Windows instance with an administrator password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateWindowsInstanceRequest {
    /// Administrator password.
    pub win_password: String,
    /// Region to place the instance in.
    pub region_id: u64,
    /// Operating system id.
    pub os_id: u64,
    /// Plan id.
    pub instance_plan: u64,
    /// Display name.
    pub instance_name: String,
}

/// Create an instance from a disk image URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateImportUrlInstanceRequest {
    /// URL of the image to import, e.g. a qcow2 file.
    pub import_url: String,
    /// Region to place the instance in.
    pub region_id: u64,
    /// Operating system id.
    pub os_id: u64,
    /// Plan id.
    pub instance_plan: u64,
    /// Display name.
    pub instance_name: String,
}

/// Create an instance from a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotInstanceRequest {
    /// SSH key to install.
    pub ssh_key_id: u64,
    /// Snapshot id; the API expects it as a string.
    pub snapshot_id: String,
    /// Plan id.
    pub instance_plan: u64,
    /// Display name.
    pub instance_name: String,
}

/// Envelope returned by every instance creation variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateInstanceResponse {
    /// Whether the API accepted the request.
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
    /// The created instance.
    pub vms: Instance,
}

/// Region available for an instance type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    /// Region id.
    pub id: u64,
    /// Region name, e.g. `Tokyo`.
    pub name: String,
    /// 1 when new instances can be placed in the region.
    #[serde(default)]
    pub use_possible: u32,
}

impl Region {
    /// Returns true if new instances can be created in this region.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.use_possible == 1
    }
}

/// Response of the region listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionListResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// Number of regions.
    #[serde(default)]
    pub total: u64,
    /// Regions.
    #[serde(default)]
    pub regionlist: Vec<Region>,
}

/// Instance type offered by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceType {
    /// Instance type id.
    pub id: u64,
    /// Internal name, e.g. `instance`.
    pub name: String,
    /// Display name, e.g. `KVM Instance`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Response of the instance type listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceTypeListResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// Number of instance types.
    #[serde(default)]
    pub total: u64,
    /// Instance types.
    #[serde(default, rename = "instanceTypes")]
    pub instance_types: Vec<InstanceType>,
}

/// SSH key registered with the account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshKey {
    /// Key id.
    pub id: u64,
    /// Service id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Owning user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Key name.
    pub name: String,
    /// Public key material.
    pub sshkey: String,
    /// Key status, e.g. `ACTIVE`.
    pub status: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl SshKey {
    /// Returns true if the key is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}

/// Response of the active SSH key listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshKeyListResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// Number of keys.
    #[serde(default)]
    pub total: u64,
    /// Active keys.
    #[serde(default)]
    pub sshkeys: Vec<SshKey>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn documented_instance() -> serde_json::Value {
        json!({
            "id": 3,
            "instance_name": "Centos Dev Env",
            "set_no": 10,
            "vps_kind": "10",
            "sequence_id": 3,
            "user_id": 1,
            "service_id": "wsi-000001",
            "status": "UNUSED",
            "sshkey_id": 1,
            "start_date": {
                "date": "2018-11-10 10:03:17.744562",
                "timezone_type": 3,
                "timezone": "UTC"
            },
            "host_id": 1,
            "plan": "2CR2GB",
            "disk_point": 12,
            "memsize": 2,
            "cpus": 2,
            "os_id": 1,
            "otherstatus": 10,
            "uuid": "9868faef-e658-4880-b4ad-fd3078e51b6a",
            "uidgid": 100003,
            "vnc_port": 10003,
            "vnc_passwd": "fHTsl4EoLfMksYKW",
            "arpaname": "192-168-0-3.pro.static.arena.ne.jp",
            "arpadate": "",
            "status_change_date": {
                "date": "2018-11-10 10:03:17.746562",
                "timezone_type": 3,
                "timezone": "UTC"
            },
            "updated_at": null,
            "vm_revert": 0
        })
    }

    #[test]
    fn instance_deserialize_documented_example() {
        let instance: Instance = serde_json::from_value(documented_instance()).unwrap();
        assert_eq!(instance.id, 3);
        assert_eq!(instance.uuid, "9868faef-e658-4880-b4ad-fd3078e51b6a");
        assert_eq!(instance.instance_name, "Centos Dev Env");
        assert_eq!(instance.plan, "2CR2GB");
        assert_eq!(instance.otherstatus, 10);
        assert_eq!(instance.uidgid, 100_003);
        assert!(instance.updated_at.is_none());
    }

    #[test]
    fn instance_dates_decode_as_records() {
        let instance: Instance = serde_json::from_value(documented_instance()).unwrap();
        assert_eq!(instance.start_date.date, "2018-11-10 10:03:17.744562");
        assert_eq!(instance.start_date.timezone_type, 3);
        assert_eq!(instance.start_date.timezone, "UTC");
        assert_eq!(
            instance.status_change_date.date,
            "2018-11-10 10:03:17.746562"
        );
    }

    #[test]
    fn instance_updated_at_may_be_absent_or_set() {
        let mut value = documented_instance();
        value.as_object_mut().unwrap().remove("updated_at");
        let instance: Instance = serde_json::from_value(value.clone()).unwrap();
        assert!(instance.updated_at.is_none());

        value["updated_at"] = json!("2018-11-11 00:00:00");
        let instance: Instance = serde_json::from_value(value).unwrap();
        assert_eq!(instance.updated_at.as_deref(), Some("2018-11-11 00:00:00"));
    }

    #[test]
    fn instance_missing_required_field_fails() {
        let mut value = documented_instance();
        value.as_object_mut().unwrap().remove("uuid");
        assert!(serde_json::from_value::<Instance>(value).is_err());
    }

    #[test]
    fn instance_null_reverse_dns_decodes_as_empty() {
        let mut value = documented_instance();
        value["arpaname"] = serde_json::Value::Null;
        value["arpadate"] = serde_json::Value::Null;

        let instance: Instance = serde_json::from_value(value).unwrap();
        assert_eq!(instance.arpaname, "");
        assert_eq!(instance.arpadate, "");
    }

    #[test]
    fn instance_null_in_other_field_fails() {
        let mut value = documented_instance();
        value["vnc_passwd"] = serde_json::Value::Null;
        assert!(serde_json::from_value::<Instance>(value).is_err());
    }

    #[test]
    fn instance_parsed_uuid() {
        let mut instance: Instance = serde_json::from_value(documented_instance()).unwrap();
        let uuid = instance.parsed_uuid().unwrap();
        assert_eq!(uuid.to_string(), "9868faef-e658-4880-b4ad-fd3078e51b6a");

        instance.uuid = "not-a-uuid".into();
        assert!(matches!(instance.parsed_uuid(), Err(Error::InvalidUuid(_))));
    }

    #[test]
    fn instance_date_parses_fractional_seconds() {
        let date = InstanceDate {
            date: "2018-11-10 10:03:17.744562".into(),
            timezone_type: 3,
            timezone: "UTC".into(),
        };
        let parsed = date.to_naive_datetime().unwrap();
        assert_eq!(parsed.to_string(), "2018-11-10 10:03:17.744562");

        let whole = InstanceDate {
            date: "2019-10-09 06:31:16".into(),
            ..date
        };
        assert!(whole.to_naive_datetime().is_some());
    }

    #[test]
    fn create_request_uses_camel_case_keys() {
        let request = CreateInstanceRequest {
            ssh_key_id: 11,
            region_id: 1,
            os_id: 1,
            instance_plan: 1,
            instance_name: "Centos Dev Env".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "sshKeyId": 11,
                "regionId": 1,
                "osId": 1,
                "instancePlan": 1,
                "instanceName": "Centos Dev Env"
            })
        );
    }

    #[test]
    fn snapshot_request_sends_snapshot_id_as_string() {
        let request = CreateSnapshotInstanceRequest {
            ssh_key_id: 1480,
            snapshot_id: "457".into(),
            instance_plan: 5,
            instance_name: "from-api-2".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["snapshotId"], json!("457"));
        assert!(value.get("regionId").is_none());
    }

    #[test]
    fn windows_and_import_requests_keys() {
        let windows = CreateWindowsInstanceRequest {
            win_password: "Test#2345jh".into(),
            region_id: 1,
            os_id: 1,
            instance_plan: 1,
            instance_name: "win".into(),
        };
        let value = serde_json::to_value(&windows).unwrap();
        assert_eq!(value["winPassword"], json!("Test#2345jh"));

        let import = CreateImportUrlInstanceRequest {
            import_url: "https://203.138.52.188/cloudn_os/CentOS7.qcow2".into(),
            region_id: 1,
            os_id: 1,
            instance_plan: 2,
            instance_name: "ImportURLinstance".into(),
        };
        let value = serde_json::to_value(&import).unwrap();
        assert_eq!(
            value["importUrl"],
            json!("https://203.138.52.188/cloudn_os/CentOS7.qcow2")
        );
    }

    #[test]
    fn error_envelope_is_not_a_create_response() {
        let body = json!({"success": false, "message": "Invalid plan"});
        assert!(serde_json::from_value::<CreateInstanceResponse>(body).is_err());
    }

    #[test]
    fn region_list_deserialize() {
        let response: RegionListResponse = serde_json::from_value(json!({
            "success": true,
            "total": 1,
            "regionlist": [{"id": 1, "name": "Tokyo", "use_possible": 1}]
        }))
        .unwrap();
        assert_eq!(response.regionlist.len(), 1);
        assert!(response.regionlist[0].is_available());
    }

    #[test]
    fn instance_type_list_uses_camel_case_key() {
        let response: InstanceTypeListResponse = serde_json::from_value(json!({
            "success": true,
            "total": 1,
            "instanceTypes": [{
                "id": 1,
                "name": "instance",
                "display_name": "KVM Instance",
                "created_at": "2019-10-09 06:31:16",
                "updated_at": "2019-10-09 06:31:16"
            }]
        }))
        .unwrap();
        assert_eq!(response.instance_types[0].display_name.as_deref(), Some("KVM Instance"));
    }

    #[test]
    fn ssh_key_is_active() {
        let key: SshKey = serde_json::from_value(json!({
            "id": 1,
            "name": "default",
            "sshkey": "ssh-rsa AAAA",
            "status": "ACTIVE"
        }))
        .unwrap();
        assert!(key.is_active());
        assert!(key.service_id.is_none());
    }
}
