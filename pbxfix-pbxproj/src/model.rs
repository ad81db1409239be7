//! Project-model operations: targets, build phases, file references, build
//! settings and app extension targets.
//!
//! Every operation is expressed as splices on [`ProjectDocument`], so the
//! formatting of untouched objects is preserved.

use crate::document::{Object, Position, ProjectDocument};
use crate::error::{ProjectError, ProjectResult};
use crate::id::ObjectId;
use crate::parse::Node;
use crate::value::Value;
use tracing::debug;

pub const NATIVE_TARGET: &str = "PBXNativeTarget";
pub const BUILD_FILE: &str = "PBXBuildFile";
pub const FILE_REFERENCE: &str = "PBXFileReference";
pub const GROUP: &str = "PBXGroup";
pub const COPY_FILES_PHASE: &str = "PBXCopyFilesBuildPhase";
pub const APP_EXTENSION_PRODUCT_TYPE: &str = "com.apple.product-type.app-extension";

/// `buildActionMask` Xcode writes for every phase.
pub const DEFAULT_BUILD_ACTION_MASK: &str = "2147483647";

/// `dstSubfolderSpec` of copy phases that embed plug-ins and app extensions.
const PLUGINS_SUBFOLDER_SPEC: &str = "13";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTree {
    Absolute,
    Group,
    Source,
    BuiltProducts,
    Sdk,
    Developer,
}

impl SourceTree {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTree::Absolute => "<absolute>",
            SourceTree::Group => "<group>",
            SourceTree::Source => "SOURCE_ROOT",
            SourceTree::BuiltProducts => "BUILT_PRODUCTS_DIR",
            SourceTree::Sdk => "SDKROOT",
            SourceTree::Developer => "DEVELOPER_DIR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhaseKind {
    Sources,
    Frameworks,
    Resources,
}

impl BuildPhaseKind {
    pub fn isa(self) -> &'static str {
        match self {
            BuildPhaseKind::Sources => "PBXSourcesBuildPhase",
            BuildPhaseKind::Frameworks => "PBXFrameworksBuildPhase",
            BuildPhaseKind::Resources => "PBXResourcesBuildPhase",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BuildPhaseKind::Sources => "Sources",
            BuildPhaseKind::Frameworks => "Frameworks",
            BuildPhaseKind::Resources => "Resources",
        }
    }
}

/// `lastKnownFileType` and build phase for a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    pub file_type: &'static str,
    pub phase: Option<BuildPhaseKind>,
}

pub fn file_type_for(name: &str) -> FileType {
    let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    let (file_type, phase) = match ext {
        "h" => ("sourcecode.c.h", None),
        "m" => ("sourcecode.c.objc", Some(BuildPhaseKind::Sources)),
        "mm" => ("sourcecode.cpp.objcpp", Some(BuildPhaseKind::Sources)),
        "c" => ("sourcecode.c.c", Some(BuildPhaseKind::Sources)),
        "cpp" | "cc" => ("sourcecode.cpp.cpp", Some(BuildPhaseKind::Sources)),
        "swift" => ("sourcecode.swift", Some(BuildPhaseKind::Sources)),
        "a" => ("archive.ar", Some(BuildPhaseKind::Frameworks)),
        "framework" => ("wrapper.framework", Some(BuildPhaseKind::Frameworks)),
        "tbd" => ("sourcecode.text-based-dylib-definition", Some(BuildPhaseKind::Frameworks)),
        "dylib" => ("compiled.mach-o.dylib", Some(BuildPhaseKind::Frameworks)),
        "plist" => ("text.plist.xml", None),
        "entitlements" => ("text.plist.entitlements", None),
        "appex" => ("wrapper.app-extension", None),
        "png" | "jpg" => ("image.png", Some(BuildPhaseKind::Resources)),
        _ => ("text", None),
    };
    FileType { file_type, phase }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub id: String,
    pub name: String,
    pub product_type: Option<String>,
}

fn oid(s: &str) -> ProjectResult<ObjectId> {
    Ok(ObjectId::parse(s)?)
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl ProjectDocument {
    fn project_object(&self) -> ProjectResult<Object<'_>> {
        let root = self.root_object_id()?;
        self.require(root)
    }

    /// Native targets in the order the project lists them.
    pub fn targets(&self) -> Vec<TargetInfo> {
        let listed: Vec<&str> = self
            .project_object()
            .ok()
            .and_then(|p| p.get_array("targets"))
            .map(|a| a.values().collect())
            .unwrap_or_default();

        listed
            .into_iter()
            .filter_map(|id| self.object(id))
            .filter(|o| o.isa() == Some(NATIVE_TARGET))
            .map(|o| TargetInfo {
                id: o.id().to_string(),
                name: o.get_str("name").unwrap_or_default().to_string(),
                product_type: o.get_str("productType").map(str::to_string),
            })
            .collect()
    }

    pub fn target_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects_with_isa(NATIVE_TARGET)
            .find(|o| o.get_str("name") == Some(name))
            .and_then(|o| ObjectId::parse(o.id()).ok())
    }

    pub fn require_target(&self, name: &str) -> ProjectResult<ObjectId> {
        self.target_by_name(name)
            .ok_or_else(|| ProjectError::UnknownTarget { name: name.to_string() })
    }

    pub fn target_name(&self, target: &str) -> Option<&str> {
        self.object(target).and_then(|o| o.get_str("name"))
    }

    fn require_native_target(&self, target: &str) -> ProjectResult<Object<'_>> {
        let obj = self.require(target)?;
        if obj.isa() != Some(NATIVE_TARGET) {
            return Err(ProjectError::shape(target, "not a native target"));
        }
        Ok(obj)
    }

    /// First build phase of `target` whose `isa` matches.
    pub fn build_phase_of(&self, target: &str, isa: &str) -> ProjectResult<Option<ObjectId>> {
        let obj = self.require_native_target(target)?;
        let phases = obj
            .get_array("buildPhases")
            .ok_or_else(|| ProjectError::shape(target, "missing buildPhases"))?;
        phases
            .values()
            .find(|id| self.object(id).and_then(|p| p.isa()) == Some(isa))
            .map(oid)
            .transpose()
    }

    pub fn frameworks_build_phase(&self, target: &str) -> ProjectResult<Option<ObjectId>> {
        self.build_phase_of(target, BuildPhaseKind::Frameworks.isa())
    }

    /// Configuration ids of `target`, via its configuration list.
    pub fn build_configurations(&self, target: &str) -> ProjectResult<Vec<ObjectId>> {
        let obj = self.require(target)?;
        let list_id = obj
            .get_str("buildConfigurationList")
            .ok_or_else(|| ProjectError::shape(target, "missing buildConfigurationList"))?;
        let list = self.require(list_id)?;
        list.get_array("buildConfigurations")
            .ok_or_else(|| ProjectError::shape(list_id, "missing buildConfigurations"))?
            .values()
            .map(oid)
            .collect()
    }

    pub fn build_setting(&self, config: &str, key: &str) -> Option<&Node> {
        self.object(config)?.get_dict("buildSettings")?.get(key)
    }

    /// The first value of a build setting, scalar or list.
    pub fn build_setting_str(&self, config: &str, key: &str) -> Option<&str> {
        match self.build_setting(config, key)? {
            Node::Scalar(s) => Some(&s.value),
            Node::Array(a) => a.values().next(),
            Node::Dict(_) => None,
        }
    }

    pub fn main_group(&self) -> ProjectResult<ObjectId> {
        let project = self.project_object()?;
        let id = project
            .get_str("mainGroup")
            .ok_or_else(|| ProjectError::shape(project.id(), "missing mainGroup"))?;
        oid(id)
    }

    pub fn find_file_by_path(&self, path: &str) -> Option<ObjectId> {
        self.objects_with_isa(FILE_REFERENCE)
            .find(|o| o.get_str("path") == Some(path))
            .and_then(|o| ObjectId::parse(o.id()).ok())
    }

    fn child_group(&self, parent: &str, name: &str) -> ProjectResult<Option<ObjectId>> {
        let group = self.require(parent)?;
        let children = group
            .get_array("children")
            .ok_or_else(|| ProjectError::shape(parent, "missing children"))?;
        children
            .values()
            .find(|id| {
                self.object(id).is_some_and(|o| {
                    o.isa() == Some(GROUP)
                        && (o.get_str("name") == Some(name) || o.get_str("path") == Some(name))
                })
            })
            .map(oid)
            .transpose()
    }

    fn ensure_group(&mut self, parent: &ObjectId, name: &str) -> ProjectResult<ObjectId> {
        if let Some(existing) = self.child_group(parent.as_str(), name)? {
            return Ok(existing);
        }
        let id = self.fresh_id(GROUP, name);
        self.insert_object(
            &id,
            Some(name),
            GROUP,
            &[
                ("children".to_string(), Value::List(vec![])),
                ("name".to_string(), Value::str(name)),
                ("sourceTree".to_string(), Value::str(SourceTree::Group.as_str())),
            ],
            false,
        )?;
        self.insert_array_item(parent.as_str(), "children", &Value::reference(&id, name), Position::Back)?;
        debug!(group = name, id = id.as_str(), "created group");
        Ok(id)
    }

    /// Adds a file reference for `path`, placed in the group hierarchy given by
    /// `project_path`. Returns the existing reference when `path` is already
    /// known.
    pub fn add_file(&mut self, path: &str, project_path: &str, tree: SourceTree) -> ProjectResult<ObjectId> {
        if let Some(existing) = self.find_file_by_path(path) {
            return Ok(existing);
        }

        let mut parts: Vec<&str> = project_path.split('/').filter(|p| !p.is_empty()).collect();
        let name = parts
            .pop()
            .ok_or_else(|| ProjectError::shape(project_path, "empty project path"))?
            .to_string();
        let mut group = self.main_group()?;
        for part in parts {
            group = self.ensure_group(&group, part)?;
        }

        let id = self.fresh_id(FILE_REFERENCE, project_path);
        let mut fields = vec![(
            "lastKnownFileType".to_string(),
            Value::str(file_type_for(&name).file_type),
        )];
        if name != path {
            fields.push(("name".to_string(), Value::str(name.as_str())));
        }
        fields.push(("path".to_string(), Value::str(path)));
        fields.push(("sourceTree".to_string(), Value::str(tree.as_str())));

        self.insert_object(&id, Some(&name), FILE_REFERENCE, &fields, true)?;
        self.insert_array_item(group.as_str(), "children", &Value::reference(&id, name.as_str()), Position::Back)?;
        debug!(path, id = id.as_str(), "added file reference");
        Ok(id)
    }

    /// True if `phase` already holds a build file for `file_ref`.
    pub fn phase_links(&self, phase: &str, file_ref: &str) -> ProjectResult<bool> {
        let obj = self.require(phase)?;
        let files = obj
            .get_array("files")
            .ok_or_else(|| ProjectError::shape(phase, "missing files"))?;
        Ok(files
            .values()
            .filter_map(|id| self.object(id))
            .any(|bf| bf.get_str("fileRef") == Some(file_ref)))
    }

    fn add_build_file(
        &mut self,
        phase: &ObjectId,
        file_ref: &ObjectId,
        name: &str,
        settings: Option<Value>,
    ) -> ProjectResult<ObjectId> {
        let label = self
            .require(phase.as_str())?
            .comment()
            .unwrap_or("Frameworks")
            .to_string();
        let comment = format!("{name} in {label}");

        let id = self.fresh_id(BUILD_FILE, &comment);
        let mut fields = vec![("fileRef".to_string(), Value::reference(file_ref, name))];
        if let Some(settings) = settings {
            fields.push(("settings".to_string(), settings));
        }
        self.insert_object(&id, Some(&comment), BUILD_FILE, &fields, true)?;
        self.insert_array_item(phase.as_str(), "files", &Value::reference(&id, comment.as_str()), Position::Back)?;
        Ok(id)
    }

    /// Adds `file_ref` to the build phase of `target` matching its file type.
    /// Headers and other non-built files are left as plain references
    /// (`Ok(None)`), as are files the phase already holds.
    pub fn add_file_to_build(&mut self, target: &ObjectId, file_ref: &ObjectId) -> ProjectResult<Option<ObjectId>> {
        let name = {
            let f = self.require(file_ref.as_str())?;
            let raw = f
                .get_str("name")
                .or_else(|| f.get_str("path"))
                .ok_or_else(|| ProjectError::shape(file_ref.as_str(), "file reference has no name or path"))?;
            file_name(raw).to_string()
        };

        let Some(kind) = file_type_for(&name).phase else {
            debug!(file = name, "file type is not built; keeping reference only");
            return Ok(None);
        };
        let phase = self
            .build_phase_of(target.as_str(), kind.isa())?
            .ok_or_else(|| ProjectError::shape(target.as_str(), format!("no {} phase", kind.label())))?;
        if self.phase_links(phase.as_str(), file_ref.as_str())? {
            return Ok(None);
        }

        let id = self.add_build_file(&phase, file_ref, &name, None)?;
        debug!(file = name, target = target.as_str(), "added file to build");
        Ok(Some(id))
    }

    /// Links an SDK framework (`"UIKit.framework"`) into `target`, weakly when
    /// `weak` is set. Returns `Ok(None)` when it is already linked.
    pub fn add_framework_to_project(
        &mut self,
        target: &ObjectId,
        framework: &str,
        weak: bool,
    ) -> ProjectResult<Option<ObjectId>> {
        let path = format!("System/Library/Frameworks/{framework}");
        let file_ref = match self.find_file_by_path(&path) {
            Some(existing) => existing,
            None => {
                let id = self.fresh_id(FILE_REFERENCE, framework);
                self.insert_object(
                    &id,
                    Some(framework),
                    FILE_REFERENCE,
                    &[
                        ("lastKnownFileType".to_string(), Value::str("wrapper.framework")),
                        ("name".to_string(), Value::str(framework)),
                        ("path".to_string(), Value::str(path.as_str())),
                        ("sourceTree".to_string(), Value::str(SourceTree::Sdk.as_str())),
                    ],
                    true,
                )?;
                let main = self.main_group()?;
                let group = self.child_group(main.as_str(), "Frameworks")?.unwrap_or(main);
                self.insert_array_item(group.as_str(), "children", &Value::reference(&id, framework), Position::Back)?;
                id
            }
        };

        let phase = self
            .frameworks_build_phase(target.as_str())?
            .ok_or_else(|| ProjectError::shape(target.as_str(), "no Frameworks phase"))?;
        if self.phase_links(phase.as_str(), file_ref.as_str())? {
            debug!(framework, target = target.as_str(), "framework already linked");
            return Ok(None);
        }

        let settings = weak.then(|| {
            Value::Dict(vec![(
                "ATTRIBUTES".to_string(),
                Value::List(vec![Value::str("Weak")]),
            )])
        });
        let id = self.add_build_file(&phase, &file_ref, framework, settings)?;
        debug!(framework, weak, target = target.as_str(), "linked framework");
        Ok(Some(id))
    }

    /// Sets `key = value` in every configuration of `target`, replacing any
    /// previous value.
    pub fn set_build_property(&mut self, target: &ObjectId, key: &str, value: &str) -> ProjectResult<()> {
        for config in self.build_configurations(target.as_str())? {
            self.set_in_dict(config.as_str(), "buildSettings", key, &Value::str(value))?;
        }
        Ok(())
    }

    /// Adds `value` to `key` in every configuration of `target`. A scalar
    /// setting becomes a list; values already present are not repeated.
    pub fn add_build_property(&mut self, target: &ObjectId, key: &str, value: &str) -> ProjectResult<()> {
        for config in self.build_configurations(target.as_str())? {
            let edit = {
                let obj = self.require(config.as_str())?;
                let settings_entry = obj
                    .body
                    .entry("buildSettings")
                    .ok_or_else(|| ProjectError::shape(config.as_str(), "missing buildSettings"))?;
                let settings = settings_entry
                    .value
                    .as_dict()
                    .ok_or_else(|| ProjectError::shape(config.as_str(), "buildSettings is not a dictionary"))?;

                match settings.entry(key) {
                    None => Some(self.dict_assignment(settings_entry.key.span.start, settings, key, &Value::str(value))),
                    Some(existing) => match &existing.value {
                        Node::Scalar(s) if s.value == value => None,
                        Node::Scalar(s) => {
                            let list = Value::List(vec![Value::str(s.value.as_str()), Value::str(value)]);
                            Some(self.dict_assignment(settings_entry.key.span.start, settings, key, &list))
                        }
                        Node::Array(a) if a.contains(value) => None,
                        Node::Array(a) => {
                            let (at, text) = self.array_insertion(existing.key.span.start, a, &Value::str(value), Position::Back);
                            Some((at..at, text))
                        }
                        Node::Dict(_) => {
                            return Err(ProjectError::shape(config.as_str(), format!("{key} is a dictionary")));
                        }
                    },
                }
            };
            if let Some((range, text)) = edit {
                self.splice(range, text)?;
            }
        }
        Ok(())
    }

    /// Creates an app extension target embedded into `main_target` and
    /// returns its id.
    ///
    /// The extension gets one configuration per configuration name of the
    /// main target, empty Sources/Resources/Frameworks phases, a dependency
    /// from the main target, and a build file in the main target's
    /// `Embed App Extensions` phase.
    pub fn add_app_extension(
        &mut self,
        main_target: &ObjectId,
        name: &str,
        bundle_id: &str,
        info_plist: &str,
    ) -> ProjectResult<ObjectId> {
        let project_id = oid(self.root_object_id()?)?;
        let product_group = {
            let project = self.require(project_id.as_str())?;
            project
                .get_str("productRefGroup")
                .ok_or_else(|| ProjectError::shape(project_id.as_str(), "missing productRefGroup"))
                .and_then(oid)?
        };

        let (config_names, default_config) = {
            let configs = self.build_configurations(main_target.as_str())?;
            let names: Vec<String> = configs
                .iter()
                .filter_map(|c| self.object(c.as_str()).and_then(|o| o.get_str("name")))
                .map(str::to_string)
                .collect();
            let list_default = self
                .object(main_target.as_str())
                .and_then(|t| t.get_str("buildConfigurationList"))
                .and_then(|l| self.object(l))
                .and_then(|l| l.get_str("defaultConfigurationName"))
                .unwrap_or("Release")
                .to_string();
            (names, list_default)
        };

        // Product reference.
        let product_name = format!("{name}.appex");
        let product = self.fresh_id(FILE_REFERENCE, &product_name);
        self.insert_object(
            &product,
            Some(&product_name),
            FILE_REFERENCE,
            &[
                ("explicitFileType".to_string(), Value::str("wrapper.app-extension")),
                ("includeInIndex".to_string(), Value::str("0")),
                ("path".to_string(), Value::str(product_name.as_str())),
                ("sourceTree".to_string(), Value::str(SourceTree::BuiltProducts.as_str())),
            ],
            true,
        )?;
        self.insert_array_item(
            product_group.as_str(),
            "children",
            &Value::reference(&product, product_name.as_str()),
            Position::Back,
        )?;

        // Configurations.
        let mut configs = Vec::new();
        for config_name in &config_names {
            let id = self.fresh_id("XCBuildConfiguration", &format!("{name}/{config_name}"));
            let settings = Value::Dict(vec![
                ("INFOPLIST_FILE".to_string(), Value::str(info_plist)),
                (
                    "LD_RUNPATH_SEARCH_PATHS".to_string(),
                    Value::str("$(inherited) @executable_path/Frameworks @executable_path/../../Frameworks"),
                ),
                ("PRODUCT_BUNDLE_IDENTIFIER".to_string(), Value::str(bundle_id)),
                ("PRODUCT_NAME".to_string(), Value::str("$(TARGET_NAME)")),
                ("SKIP_INSTALL".to_string(), Value::str("YES")),
            ]);
            self.insert_object(
                &id,
                Some(config_name),
                "XCBuildConfiguration",
                &[
                    ("buildSettings".to_string(), settings),
                    ("name".to_string(), Value::str(config_name.as_str())),
                ],
                false,
            )?;
            configs.push(Value::reference(&id, config_name.as_str()));
        }

        let list_comment = format!("Build configuration list for PBXNativeTarget \"{name}\"");
        let list = self.fresh_id("XCConfigurationList", name);
        self.insert_object(
            &list,
            Some(&list_comment),
            "XCConfigurationList",
            &[
                ("buildConfigurations".to_string(), Value::List(configs)),
                ("defaultConfigurationIsVisible".to_string(), Value::str("0")),
                ("defaultConfigurationName".to_string(), Value::str(default_config.as_str())),
            ],
            false,
        )?;

        // Build phases.
        let mut phases = Vec::new();
        for kind in [BuildPhaseKind::Sources, BuildPhaseKind::Resources, BuildPhaseKind::Frameworks] {
            let id = self.fresh_id(kind.isa(), name);
            self.insert_object(
                &id,
                Some(kind.label()),
                kind.isa(),
                &[
                    ("buildActionMask".to_string(), Value::str(DEFAULT_BUILD_ACTION_MASK)),
                    ("files".to_string(), Value::List(vec![])),
                    ("runOnlyForDeploymentPostprocessing".to_string(), Value::str("0")),
                ],
                false,
            )?;
            phases.push(Value::reference(&id, kind.label()));
        }

        // The target itself.
        let target = self.fresh_id(NATIVE_TARGET, name);
        self.insert_object(
            &target,
            Some(name),
            NATIVE_TARGET,
            &[
                ("buildConfigurationList".to_string(), Value::reference(&list, list_comment.as_str())),
                ("buildPhases".to_string(), Value::List(phases)),
                ("buildRules".to_string(), Value::List(vec![])),
                ("dependencies".to_string(), Value::List(vec![])),
                ("name".to_string(), Value::str(name)),
                ("productName".to_string(), Value::str(name)),
                ("productReference".to_string(), Value::reference(&product, product_name.as_str())),
                ("productType".to_string(), Value::str(APP_EXTENSION_PRODUCT_TYPE)),
            ],
            false,
        )?;
        self.insert_array_item(project_id.as_str(), "targets", &Value::reference(&target, name), Position::Back)?;

        // Main target depends on the extension.
        let proxy = self.fresh_id("PBXContainerItemProxy", name);
        self.insert_object(
            &proxy,
            Some("PBXContainerItemProxy"),
            "PBXContainerItemProxy",
            &[
                ("containerPortal".to_string(), Value::reference(&project_id, "Project object")),
                ("proxyType".to_string(), Value::str("1")),
                ("remoteGlobalIDString".to_string(), Value::Ref(target.clone(), None)),
                ("remoteInfo".to_string(), Value::str(name)),
            ],
            false,
        )?;
        let dependency = self.fresh_id("PBXTargetDependency", name);
        self.insert_object(
            &dependency,
            Some("PBXTargetDependency"),
            "PBXTargetDependency",
            &[
                ("target".to_string(), Value::reference(&target, name)),
                ("targetProxy".to_string(), Value::reference(&proxy, "PBXContainerItemProxy")),
            ],
            false,
        )?;
        self.insert_array_item(
            main_target.as_str(),
            "dependencies",
            &Value::reference(&dependency, "PBXTargetDependency"),
            Position::Back,
        )?;

        // Embed the product.
        let embed = self.embed_extensions_phase(main_target)?;
        self.add_build_file(
            &embed,
            &product,
            &product_name,
            Some(Value::Dict(vec![(
                "ATTRIBUTES".to_string(),
                Value::List(vec![Value::str("RemoveHeadersOnCopy")]),
            )])),
        )?;

        debug!(name, bundle_id, id = target.as_str(), "added app extension target");
        Ok(target)
    }

    /// The copy-files phase of `target` that embeds app extensions, created
    /// when missing.
    fn embed_extensions_phase(&mut self, target: &ObjectId) -> ProjectResult<ObjectId> {
        let existing = {
            let obj = self.require_native_target(target.as_str())?;
            obj.get_array("buildPhases")
                .ok_or_else(|| ProjectError::shape(target.as_str(), "missing buildPhases"))?
                .values()
                .find(|id| {
                    self.object(id).is_some_and(|p| {
                        p.isa() == Some(COPY_FILES_PHASE)
                            && p.get_str("dstSubfolderSpec") == Some(PLUGINS_SUBFOLDER_SPEC)
                    })
                })
                .map(oid)
                .transpose()?
        };
        if let Some(id) = existing {
            return Ok(id);
        }

        let label = "Embed App Extensions";
        let id = self.fresh_id(COPY_FILES_PHASE, label);
        self.insert_object(
            &id,
            Some(label),
            COPY_FILES_PHASE,
            &[
                ("buildActionMask".to_string(), Value::str(DEFAULT_BUILD_ACTION_MASK)),
                ("dstPath".to_string(), Value::str("")),
                ("dstSubfolderSpec".to_string(), Value::str(PLUGINS_SUBFOLDER_SPEC)),
                ("files".to_string(), Value::List(vec![])),
                ("name".to_string(), Value::str(label)),
                ("runOnlyForDeploymentPostprocessing".to_string(), Value::str("0")),
            ],
            false,
        )?;
        self.insert_array_item(target.as_str(), "buildPhases", &Value::reference(&id, label), Position::Back)?;
        Ok(id)
    }
}
